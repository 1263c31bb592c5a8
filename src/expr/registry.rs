//! Registro imutável de operadores, funções e constantes nomeadas.
//!
//! Cada símbolo tem um nome de wire (usado no payload), um token de exibição
//! e uma regra de avaliação. As tabelas são estáticas e somente leitura; a
//! decodificação resolve símbolos por nome através de `from_name`.

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::{CalcError, CalcResult};

// ═══════════════════════════════════════════════════════════════════════════
// Operadores binários
// ═══════════════════════════════════════════════════════════════════════════

/// Operador binário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Entrada do registro de operadores binários.
#[derive(Debug)]
pub struct BinaryOpEntry {
    pub op: BinaryOp,
    pub name: &'static str,
    pub token: &'static str,
    /// Maior liga mais forte.
    pub precedence: u8,
    pub right_assoc: bool,
    rule: fn(f64, f64) -> f64,
}

/// Tabela de operadores binários, na ordem dos discriminantes de [`BinaryOp`].
pub static BINARY_OPERATORS: [BinaryOpEntry; 6] = [
    BinaryOpEntry {
        op: BinaryOp::Add,
        name: "add",
        token: "+",
        precedence: 1,
        right_assoc: false,
        rule: |l, r| l + r,
    },
    BinaryOpEntry {
        op: BinaryOp::Sub,
        name: "sub",
        token: "-",
        precedence: 1,
        right_assoc: false,
        rule: |l, r| l - r,
    },
    BinaryOpEntry {
        op: BinaryOp::Mul,
        name: "mul",
        token: "*",
        precedence: 2,
        right_assoc: false,
        rule: |l, r| l * r,
    },
    BinaryOpEntry {
        op: BinaryOp::Div,
        name: "div",
        token: "/",
        precedence: 2,
        right_assoc: false,
        rule: |l, r| l / r,
    },
    BinaryOpEntry {
        op: BinaryOp::Mod,
        name: "mod",
        token: "%",
        precedence: 2,
        right_assoc: false,
        // Módulo com o sinal do divisor.
        rule: |l, r| l - r * (l / r).floor(),
    },
    BinaryOpEntry {
        op: BinaryOp::Pow,
        name: "pow",
        token: "^",
        precedence: 4,
        right_assoc: true,
        rule: f64::powf,
    },
];

impl BinaryOp {
    /// Entrada do registro para este operador.
    pub fn entry(self) -> &'static BinaryOpEntry {
        &BINARY_OPERATORS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn token(self) -> &'static str {
        self.entry().token
    }

    /// Busca um operador pelo nome de wire.
    pub fn from_name(name: &str) -> Option<Self> {
        BINARY_OPERATORS
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.op)
    }

    /// Aplica a regra do operador.
    ///
    /// Divisão ou módulo por zero e resultados não finitos são erros de domínio.
    pub fn apply(self, left: f64, right: f64) -> CalcResult<f64> {
        if matches!(self, BinaryOp::Div | BinaryOp::Mod) && right == 0.0 {
            return Err(CalcError::evaluation(format!(
                "{} by zero in {left} {} {right}",
                if self == BinaryOp::Div { "division" } else { "modulo" },
                self.token()
            )));
        }
        let value = (self.entry().rule)(left, right);
        finite(value, || format!("{left} {} {right}", self.token()))
    }

    /// Constrói `left <op> right` sem avaliar.
    pub fn of(self, left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
        Expression::binary(left, self, right)
    }
}

impl TryFrom<String> for BinaryOp {
    type Error = CalcError;

    fn try_from(name: String) -> CalcResult<Self> {
        Self::from_name(&name)
            .ok_or_else(|| CalcError::malformed(format!("unknown binary operator `{name}`")))
    }
}

impl From<BinaryOp> for String {
    fn from(op: BinaryOp) -> Self {
        op.name().to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operadores unários
// ═══════════════════════════════════════════════════════════════════════════

/// Operador unário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// Entrada do registro de operadores unários.
#[derive(Debug)]
pub struct UnaryOpEntry {
    pub op: UnaryOp,
    pub name: &'static str,
    pub token: &'static str,
    rule: fn(f64) -> f64,
}

/// Precedência de qualquer operador unário (entre `* / %` e `^`).
pub const UNARY_PRECEDENCE: u8 = 3;

pub static UNARY_OPERATORS: [UnaryOpEntry; 2] = [
    UnaryOpEntry {
        op: UnaryOp::Neg,
        name: "neg",
        token: "-",
        rule: |x| -x,
    },
    UnaryOpEntry {
        op: UnaryOp::Pos,
        name: "pos",
        token: "+",
        rule: |x| x,
    },
];

impl UnaryOp {
    pub fn entry(self) -> &'static UnaryOpEntry {
        &UNARY_OPERATORS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn token(self) -> &'static str {
        self.entry().token
    }

    pub fn from_name(name: &str) -> Option<Self> {
        UNARY_OPERATORS
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.op)
    }

    pub fn apply(self, operand: f64) -> CalcResult<f64> {
        finite((self.entry().rule)(operand), || {
            format!("{}{operand}", self.token())
        })
    }

    /// Constrói `<op>operand` sem avaliar.
    pub fn of(self, operand: impl Into<Expression>) -> Expression {
        Expression::unary(self, operand)
    }
}

impl TryFrom<String> for UnaryOp {
    type Error = CalcError;

    fn try_from(name: String) -> CalcResult<Self> {
        Self::from_name(&name)
            .ok_or_else(|| CalcError::malformed(format!("unknown unary operator `{name}`")))
    }
}

impl From<UnaryOp> for String {
    fn from(op: UnaryOp) -> Self {
        op.name().to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Funções
// ═══════════════════════════════════════════════════════════════════════════

/// Função embutida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Log,
    Pow,
    Max,
    Min,
}

/// Número de argumentos aceito por uma função.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Variádica com um mínimo.
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Entrada do registro de funções.
#[derive(Debug)]
pub struct FunctionEntry {
    pub function: Function,
    pub name: &'static str,
    pub token: &'static str,
    pub arity: Arity,
    rule: fn(&[f64]) -> f64,
}

pub static FUNCTIONS: [FunctionEntry; 8] = [
    FunctionEntry {
        function: Function::Sin,
        name: "sin",
        token: "sin",
        arity: Arity::Exact(1),
        rule: |a| a[0].sin(),
    },
    FunctionEntry {
        function: Function::Cos,
        name: "cos",
        token: "cos",
        arity: Arity::Exact(1),
        rule: |a| a[0].cos(),
    },
    FunctionEntry {
        function: Function::Tan,
        name: "tan",
        token: "tan",
        arity: Arity::Exact(1),
        rule: |a| a[0].tan(),
    },
    FunctionEntry {
        function: Function::Sqrt,
        name: "sqrt",
        token: "sqrt",
        arity: Arity::Exact(1),
        rule: |a| a[0].sqrt(),
    },
    FunctionEntry {
        function: Function::Log,
        name: "log",
        token: "log",
        arity: Arity::Exact(1),
        rule: |a| a[0].ln(),
    },
    FunctionEntry {
        function: Function::Pow,
        name: "pow",
        token: "pow",
        arity: Arity::Exact(2),
        rule: |a| a[0].powf(a[1]),
    },
    FunctionEntry {
        function: Function::Max,
        name: "max",
        token: "max",
        arity: Arity::AtLeast(1),
        rule: |a| a.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    },
    FunctionEntry {
        function: Function::Min,
        name: "min",
        token: "min",
        arity: Arity::AtLeast(1),
        rule: |a| a.iter().copied().fold(f64::INFINITY, f64::min),
    },
];

impl Function {
    pub fn entry(self) -> &'static FunctionEntry {
        &FUNCTIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn token(self) -> &'static str {
        self.entry().token
    }

    pub fn arity(self) -> Arity {
        self.entry().arity
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FUNCTIONS
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.function)
    }

    /// Aplica a função, verificando a aridade antes.
    pub fn apply(self, args: &[f64]) -> CalcResult<f64> {
        let arity = self.arity();
        if !arity.accepts(args.len()) {
            return Err(CalcError::evaluation(format!(
                "{} takes {arity} argument(s), got {}",
                self.name(),
                args.len()
            )));
        }
        finite((self.entry().rule)(args), || {
            let rendered: Vec<String> = args.iter().map(f64::to_string).collect();
            format!("{}({})", self.token(), rendered.join(", "))
        })
    }

    /// Constrói uma chamada sem avaliar (a aridade só é verificada na avaliação).
    pub fn call<I, E>(self, args: I) -> Expression
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Expression::call(self, args)
    }
}

impl TryFrom<String> for Function {
    type Error = CalcError;

    fn try_from(name: String) -> CalcResult<Self> {
        Self::from_name(&name)
            .ok_or_else(|| CalcError::malformed(format!("unknown function `{name}`")))
    }
}

impl From<Function> for String {
    fn from(function: Function) -> Self {
        function.name().to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Constantes nomeadas
// ═══════════════════════════════════════════════════════════════════════════

/// Constante matemática conhecida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NamedConstant {
    Pi,
    Tau,
    E,
}

#[derive(Debug)]
pub struct NamedConstantEntry {
    pub constant: NamedConstant,
    pub name: &'static str,
    pub token: &'static str,
    pub value: f64,
}

pub static NAMED_CONSTANTS: [NamedConstantEntry; 3] = [
    NamedConstantEntry {
        constant: NamedConstant::Pi,
        name: "pi",
        token: "π",
        value: std::f64::consts::PI,
    },
    NamedConstantEntry {
        constant: NamedConstant::Tau,
        name: "tau",
        token: "τ",
        value: std::f64::consts::TAU,
    },
    NamedConstantEntry {
        constant: NamedConstant::E,
        name: "e",
        token: "e",
        value: std::f64::consts::E,
    },
];

impl NamedConstant {
    pub fn entry(self) -> &'static NamedConstantEntry {
        &NAMED_CONSTANTS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn token(self) -> &'static str {
        self.entry().token
    }

    pub fn value(self) -> f64 {
        self.entry().value
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_CONSTANTS
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.constant)
    }
}

impl TryFrom<String> for NamedConstant {
    type Error = CalcError;

    fn try_from(name: String) -> CalcResult<Self> {
        Self::from_name(&name)
            .ok_or_else(|| CalcError::malformed(format!("unknown named constant `{name}`")))
    }
}

impl From<NamedConstant> for String {
    fn from(constant: NamedConstant) -> Self {
        constant.name().to_string()
    }
}

/// Rejeita NaN e infinitos como erro de domínio.
fn finite(value: f64, describe: impl FnOnce() -> String) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::evaluation(format!(
            "math domain error in {}",
            describe()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_match_discriminants() {
        for (i, entry) in BINARY_OPERATORS.iter().enumerate() {
            assert_eq!(entry.op as usize, i);
        }
        for (i, entry) in UNARY_OPERATORS.iter().enumerate() {
            assert_eq!(entry.op as usize, i);
        }
        for (i, entry) in FUNCTIONS.iter().enumerate() {
            assert_eq!(entry.function as usize, i);
        }
        for (i, entry) in NAMED_CONSTANTS.iter().enumerate() {
            assert_eq!(entry.constant as usize, i);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(BinaryOp::from_name("mul"), Some(BinaryOp::Mul));
        assert_eq!(UnaryOp::from_name("neg"), Some(UnaryOp::Neg));
        assert_eq!(Function::from_name("max"), Some(Function::Max));
        assert_eq!(NamedConstant::from_name("tau"), Some(NamedConstant::Tau));
        assert_eq!(BinaryOp::from_name("xor"), None);
        assert_eq!(Function::from_name("rand"), None);
    }

    #[test]
    fn test_binary_rules() {
        assert_eq!(BinaryOp::Add.apply(2.0, 3.0).unwrap(), 5.0);
        assert_eq!(BinaryOp::Pow.apply(2.0, 3.0).unwrap(), 8.0);
        assert_eq!(BinaryOp::Mod.apply(7.0, 3.0).unwrap(), 1.0);
        // Sinal do divisor
        assert_eq!(BinaryOp::Mod.apply(-7.0, 3.0).unwrap(), 2.0);
        assert_eq!(BinaryOp::Mod.apply(7.0, -3.0).unwrap(), -2.0);
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let err = BinaryOp::Div.apply(1.0, 0.0).unwrap_err();
        assert!(matches!(err, CalcError::Evaluation(_)));
        assert!(err.to_string().contains("division by zero"));
        assert!(BinaryOp::Mod.apply(1.0, 0.0).is_err());
    }

    #[test]
    fn test_domain_errors() {
        assert!(Function::Sqrt.apply(&[-1.0]).is_err());
        assert!(Function::Log.apply(&[0.0]).is_err());
        assert!(BinaryOp::Pow.apply(-8.0, 1.0 / 3.0).is_err());
    }

    #[test]
    fn test_function_arity() {
        assert_eq!(Function::Max.apply(&[2.0, 12.0, 5.0]).unwrap(), 12.0);
        assert_eq!(Function::Min.apply(&[2.0, 12.0, 5.0]).unwrap(), 2.0);
        assert_eq!(Function::Pow.apply(&[2.0, 10.0]).unwrap(), 1024.0);

        let err = Function::Sin.apply(&[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("exactly 1"));
        assert!(Function::Max.apply(&[]).is_err());
    }

    #[test]
    fn test_unary_rules() {
        assert_eq!(UnaryOp::Neg.apply(4.0).unwrap(), -4.0);
        assert_eq!(UnaryOp::Pos.apply(-4.0).unwrap(), -4.0);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&BinaryOp::Div).unwrap(), "\"div\"");
        assert_eq!(serde_json::to_string(&NamedConstant::Pi).unwrap(), "\"pi\"");

        let op: Function = serde_json::from_str("\"sqrt\"").unwrap();
        assert_eq!(op, Function::Sqrt);

        let err = serde_json::from_str::<BinaryOp>("\"xor\"").unwrap_err();
        assert!(err.to_string().contains("unknown binary operator"));
    }
}
