//! Calculator tools.
//!
//! Tool names are the wire names clients already use (`soma`, `divisao`,
//! `avaliar_expressao`, ...). Every numeric result is returned as a JSON
//! number under `result`.

mod expr;

pub use expr::{ALLOWED_CHARS, ExprError, evaluate};

use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ToolError, ToolResult};
use crate::tools::registry::{object_schema, parse_args, structured_result};
use crate::tools::{ToolContext, ToolFuture, ToolHandler, ToolRegistry};

pub const PRECEDENCE_HELP: &str = "\
OPERATOR PRECEDENCE:

1. GROUPING:
   * Parentheses () - always evaluated first

2. OPERATORS (highest -> lowest precedence):
   * Power (**)
   * Multiplication (*), division (/) and floor division (//)
   * Addition (+) and subtraction (-)

EXAMPLES:
* 2 + 3 * 4 = 14 (multiplication first)
* (2 + 3) * 4 = 20 (parentheses first)
* 2 ** 3 * 4 = 32 (power first)
";

pub fn add(a: f64, b: f64) -> ToolResult<f64> {
    finite(a + b)
}

pub fn subtract(a: f64, b: f64) -> ToolResult<f64> {
    finite(a - b)
}

pub fn multiply(a: f64, b: f64) -> ToolResult<f64> {
    finite(a * b)
}

pub fn divide(a: f64, b: f64) -> ToolResult<f64> {
    if b == 0.0 {
        return Err(ToolError::invalid_argument("Division by zero is not allowed"));
    }
    finite(a / b)
}

pub fn power(base: f64, exponent: f64) -> ToolResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(ToolError::invalid_argument(
            "Zero cannot be raised to a negative power",
        ));
    }
    finite(base.powf(exponent))
}

pub fn square_root(number: f64) -> ToolResult<f64> {
    if number < 0.0 {
        return Err(ToolError::invalid_argument(
            "Cannot take the square root of a negative number",
        ));
    }
    finite(number.sqrt())
}

pub fn tangent(angle: f64) -> ToolResult<f64> {
    finite(angle.tan())
}

pub fn constant(name: &str) -> ToolResult<f64> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        "tau" => Ok(std::f64::consts::TAU),
        other => Err(ToolError::invalid_argument(format!(
            "Unknown constant '{}'. Supported constants: pi, e, tau",
            other
        ))),
    }
}

pub fn evaluate_expression(expression: &str) -> ToolResult<f64> {
    evaluate(expression).map_err(|e| {
        ToolError::invalid_argument(format!("Error evaluating expression: {}", e))
    })
}

// JSON cannot carry NaN or infinities.
fn finite(value: f64) -> ToolResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ToolError::invalid_argument("Result is not a finite number"))
    }
}

fn number_prop(description: &str) -> serde_json::Value {
    json!({ "type": "number", "description": description })
}

fn number_output_schema() -> JsonObject {
    object_schema(&[("result", json!({ "type": "number" }))])
}

/// A tool taking two numbers.
pub struct BinaryOpHandler {
    name: &'static str,
    description: &'static str,
    params: [(&'static str, &'static str); 2],
    op: fn(f64, f64) -> ToolResult<f64>,
}

impl ToolHandler for BinaryOpHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> JsonObject {
        let [(a, a_desc), (b, b_desc)] = self.params;
        object_schema(&[(a, number_prop(a_desc)), (b, number_prop(b_desc))])
    }

    fn output_schema(&self) -> Option<JsonObject> {
        Some(number_output_schema())
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let [(a, _), (b, _)] = self.params;
            let a = number_arg(&args, a)?;
            let b = number_arg(&args, b)?;
            let value = (self.op)(a, b)?;
            Ok(structured_result(json!(value)))
        })
    }
}

/// A tool taking one number.
pub struct UnaryOpHandler {
    name: &'static str,
    description: &'static str,
    param: (&'static str, &'static str),
    op: fn(f64) -> ToolResult<f64>,
}

impl ToolHandler for UnaryOpHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[(self.param.0, number_prop(self.param.1))])
    }

    fn output_schema(&self) -> Option<JsonObject> {
        Some(number_output_schema())
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let x = number_arg(&args, self.param.0)?;
            let value = (self.op)(x)?;
            Ok(structured_result(json!(value)))
        })
    }
}

fn number_arg(args: &JsonObject, name: &str) -> ToolResult<f64> {
    args.get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ToolError::invalid_argument(format!("Missing or non-numeric argument: {}", name)))
}

#[derive(Debug, Deserialize)]
struct ConstantArgs {
    constante: String,
}

/// Handler for `constante_pi`.
pub struct ConstantHandler;

impl ToolHandler for ConstantHandler {
    fn name(&self) -> &str {
        "constante_pi"
    }

    fn description(&self) -> &str {
        "Returns a mathematical constant: \"pi\", \"e\" or \"tau\"."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[(
            "constante",
            json!({
                "type": "string",
                "description": "Name of the constant.",
                "enum": ["pi", "e", "tau"],
            }),
        )])
    }

    fn output_schema(&self) -> Option<JsonObject> {
        Some(number_output_schema())
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: ConstantArgs = parse_args(args)?;
            Ok(structured_result(json!(constant(&args.constante)?)))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExpressionArgs {
    expressao: String,
}

/// Handler for `avaliar_expressao`.
pub struct ExpressionHandler;

impl ToolHandler for ExpressionHandler {
    fn name(&self) -> &str {
        "avaliar_expressao"
    }

    fn description(&self) -> &str {
        "Evaluates an arithmetic expression following operator precedence."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[(
            "expressao",
            json!({
                "type": "string",
                "description": "Expression using digits, + - * / ** ( ) . and spaces.",
            }),
        )])
    }

    fn output_schema(&self) -> Option<JsonObject> {
        Some(number_output_schema())
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: ExpressionArgs = parse_args(args)?;
            let value = evaluate_expression(&args.expressao)?;
            tracing::debug!(expression = %args.expressao, value, "Evaluated expression");
            Ok(structured_result(json!(value)))
        })
    }
}

/// Handler for `explicar_precedencia`.
pub struct PrecedenceHelpHandler;

impl ToolHandler for PrecedenceHelpHandler {
    fn name(&self) -> &str {
        "explicar_precedencia"
    }

    fn description(&self) -> &str {
        "Explains the precedence of the arithmetic operators."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[])
    }

    fn execute(&self, _args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async { Ok(structured_result(json!(PRECEDENCE_HELP))) })
    }
}

/// Registry holding every calculator tool.
pub fn registry() -> ToolRegistry {
    ToolRegistry::new()
        .register_handler(BinaryOpHandler {
            name: "soma",
            description: "Adds two numbers.",
            params: [("a", "First addend."), ("b", "Second addend.")],
            op: add,
        })
        .register_handler(BinaryOpHandler {
            name: "subtracao",
            description: "Subtracts two numbers.",
            params: [("a", "The minuend."), ("b", "The subtrahend.")],
            op: subtract,
        })
        .register_handler(BinaryOpHandler {
            name: "multiplicacao",
            description: "Multiplies two numbers.",
            params: [("a", "First factor."), ("b", "Second factor.")],
            op: multiply,
        })
        .register_handler(BinaryOpHandler {
            name: "divisao",
            description: "Divides two numbers.",
            params: [("a", "The numerator."), ("b", "The denominator.")],
            op: divide,
        })
        .register_handler(BinaryOpHandler {
            name: "potencia",
            description: "Raises a number to a power.",
            params: [("base", "The base."), ("expoente", "The exponent.")],
            op: power,
        })
        .register_handler(UnaryOpHandler {
            name: "raiz_quadrada",
            description: "Computes the square root of a number.",
            param: ("numero", "The number to take the square root of."),
            op: square_root,
        })
        .register_handler(UnaryOpHandler {
            name: "tangente",
            description: "Computes the tangent of an angle in radians.",
            param: ("angulo", "The angle in radians."),
            op: tangent,
        })
        .register_handler(ConstantHandler)
        .register_handler(ExpressionHandler)
        .register_handler(PrecedenceHelpHandler)
}
