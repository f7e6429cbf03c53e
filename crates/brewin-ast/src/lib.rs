//! Abstract syntax tree for Brewin programs.
//!
//! The tree is produced by an external parser and handed to the interpreter
//! core, usually as a JSON document. Every node round-trips through serde.

pub mod ast {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Program {
        #[serde(default)]
        pub structs: Vec<StructDecl>,
        #[serde(default)]
        pub functions: Vec<FnDecl>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StructDecl {
        pub name: String,
        #[serde(default)]
        pub fields: Vec<FieldDecl>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FieldDecl {
        pub name: String,
        pub ty: TypeExpr,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FnDecl {
        pub name: String,
        #[serde(default)]
        pub params: Vec<Param>,
        pub ret_ty: TypeExpr,
        #[serde(default)]
        pub body: Vec<Stmt>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Param {
        pub name: String,
        pub ty: TypeExpr,
    }

    /// A type as written in the source: `int`, `bool`, `string`, `void`
    /// or a struct name.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TypeExpr(pub String);

    impl TypeExpr {
        pub fn new(name: impl Into<String>) -> Self {
            TypeExpr(name.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for TypeExpr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// A possibly dotted variable name: `p`, `p.x`, `list.next.value`.
    ///
    /// Serialized as the dotted string the parser emits.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "String", into = "String")]
    pub struct Path {
        pub segments: Vec<String>,
    }

    impl Path {
        /// The variable the path starts from.
        pub fn base(&self) -> &str {
            self.segments.first().map(String::as_str).unwrap_or("")
        }

        /// Field segments after the base variable.
        pub fn fields(&self) -> &[String] {
            self.segments.get(1..).unwrap_or(&[])
        }

        pub fn as_str(&self) -> String {
            self.segments.join(".")
        }
    }

    impl From<&str> for Path {
        fn from(s: &str) -> Self {
            Path {
                segments: s.split('.').map(str::to_string).collect(),
            }
        }
    }

    impl From<String> for Path {
        fn from(s: String) -> Self {
            Path::from(s.as_str())
        }
    }

    impl From<Path> for String {
        fn from(p: Path) -> Self {
            p.as_str()
        }
    }

    impl fmt::Display for Path {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.as_str())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Stmt {
        /// `var name: ty;`
        VarDef { name: String, ty: TypeExpr },
        /// `target = value;` where target may be dotted
        Assign { target: Path, value: Expr },
        /// Function call used as a statement
        Call(Call),
        /// `return;` or `return expr;`
        Return(Option<Expr>),
        If {
            cond: Expr,
            then_: Vec<Stmt>,
            #[serde(default)]
            else_: Option<Vec<Stmt>>,
        },
        For {
            init: Box<Stmt>,
            cond: Expr,
            update: Box<Stmt>,
            body: Vec<Stmt>,
        },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Call {
        pub name: String,
        #[serde(default)]
        pub args: Vec<Expr>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Expr {
        Lit(Lit),
        Var(Path),
        Unary {
            op: UnOp,
            expr: Box<Expr>,
        },
        Binary {
            lhs: Box<Expr>,
            op: BinOp,
            rhs: Box<Expr>,
        },
        Call(Call),
        /// `new StructName`
        New(String),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum UnOp {
        Not,
        Neg,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Lit {
        Int(i64),
        Str(String),
        Bool(bool),
        Nil,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum BinOp {
        // logical
        Or,
        And,
        // equality
        Eq,
        Ne,
        // relational
        Lt,
        Le,
        Gt,
        Ge,
        // arithmetic
        Add,
        Sub,
        Mul,
        Div,
    }

    impl BinOp {
        pub fn symbol(self) -> &'static str {
            match self {
                BinOp::Or => "||",
                BinOp::And => "&&",
                BinOp::Eq => "==",
                BinOp::Ne => "!=",
                BinOp::Lt => "<",
                BinOp::Le => "<=",
                BinOp::Gt => ">",
                BinOp::Ge => ">=",
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div => "/",
            }
        }
    }

    impl fmt::Display for BinOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.symbol())
        }
    }

    // Shorthand constructors, mostly for building trees in tests and tools.

    impl Expr {
        pub fn int(v: i64) -> Self {
            Expr::Lit(Lit::Int(v))
        }
        pub fn bool_(v: bool) -> Self {
            Expr::Lit(Lit::Bool(v))
        }
        pub fn str_(v: impl Into<String>) -> Self {
            Expr::Lit(Lit::Str(v.into()))
        }
        pub fn nil() -> Self {
            Expr::Lit(Lit::Nil)
        }
        pub fn var(path: &str) -> Self {
            Expr::Var(Path::from(path))
        }
        pub fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Self {
            Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            }
        }
        pub fn unary(op: UnOp, expr: Expr) -> Self {
            Expr::Unary {
                op,
                expr: Box::new(expr),
            }
        }
        pub fn call(name: &str, args: Vec<Expr>) -> Self {
            Expr::Call(Call {
                name: name.to_string(),
                args,
            })
        }
        pub fn new_struct(name: &str) -> Self {
            Expr::New(name.to_string())
        }
    }

    impl Stmt {
        pub fn var_def(name: &str, ty: &str) -> Self {
            Stmt::VarDef {
                name: name.to_string(),
                ty: TypeExpr::new(ty),
            }
        }
        pub fn assign(target: &str, value: Expr) -> Self {
            Stmt::Assign {
                target: Path::from(target),
                value,
            }
        }
        pub fn call(name: &str, args: Vec<Expr>) -> Self {
            Stmt::Call(Call {
                name: name.to_string(),
                args,
            })
        }
        pub fn ret(value: Option<Expr>) -> Self {
            Stmt::Return(value)
        }
    }

    impl FnDecl {
        pub fn new(name: &str, params: &[(&str, &str)], ret_ty: &str, body: Vec<Stmt>) -> Self {
            FnDecl {
                name: name.to_string(),
                params: params
                    .iter()
                    .map(|(n, t)| Param {
                        name: n.to_string(),
                        ty: TypeExpr::new(*t),
                    })
                    .collect(),
                ret_ty: TypeExpr::new(ret_ty),
                body,
            }
        }
    }

    impl StructDecl {
        pub fn new(name: &str, fields: &[(&str, &str)]) -> Self {
            StructDecl {
                name: name.to_string(),
                fields: fields
                    .iter()
                    .map(|(n, t)| FieldDecl {
                        name: n.to_string(),
                        ty: TypeExpr::new(*t),
                    })
                    .collect(),
            }
        }
    }
}
