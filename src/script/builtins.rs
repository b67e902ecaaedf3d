//! Global functions, the `Math` and `JSON` namespaces, and the methods
//! available on strings, arrays and numbers.

use std::collections::BTreeMap;

use super::error::ScriptErrorKind;
use super::value::{Value, format_number};

/// Upper bound on the length of strings built by `repeat`, `padStart` and `padEnd`.
const MAX_STRING_LENGTH: usize = 1 << 28;

/// How far past its end an array may be extended by one index write.
const MAX_ARRAY_GAP: usize = 1 << 16;

fn invalid_string_length() -> ScriptErrorKind {
    ScriptErrorKind::Type("invalid string length".into())
}

/// A function implemented by the engine rather than by script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    /// The output primitive installed by the runner.
    Append,
    String,
    Number,
    Boolean,
    ParseInt,
    ParseFloat,
    IsNaN,
    Floor,
    Ceil,
    Round,
    Trunc,
    Abs,
    Min,
    Max,
    Pow,
    Sqrt,
    Stringify,
}

impl Native {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::ParseInt => "parseInt",
            Self::ParseFloat => "parseFloat",
            Self::IsNaN => "isNaN",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Trunc => "trunc",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Pow => "pow",
            Self::Sqrt => "sqrt",
            Self::Stringify => "stringify",
        }
    }
}

/// Value of a global name that is not bound in any scope.
#[must_use]
pub fn global(name: &str) -> Option<Value> {
    let native = match name {
        "String" => Native::String,
        "Number" => Native::Number,
        "Boolean" => Native::Boolean,
        "parseInt" => Native::ParseInt,
        "parseFloat" => Native::ParseFloat,
        "isNaN" => Native::IsNaN,
        "NaN" => return Some(Value::Number(f64::NAN)),
        "Infinity" => return Some(Value::Number(f64::INFINITY)),
        "Math" => return Some(namespace(&[
            Native::Floor,
            Native::Ceil,
            Native::Round,
            Native::Trunc,
            Native::Abs,
            Native::Min,
            Native::Max,
            Native::Pow,
            Native::Sqrt,
        ])),
        "JSON" => return Some(namespace(&[Native::Stringify])),
        _ => return None,
    };
    Some(Value::Native(native))
}

fn namespace(natives: &[Native]) -> Value {
    let members: BTreeMap<_, _> = natives
        .iter()
        .map(|n| (n.name().to_string(), Value::Native(*n)))
        .collect();
    Value::Object(members)
}

fn arg(args: &[Value], i: usize) -> &Value {
    const UNDEFINED: &Value = &Value::Undefined;
    args.get(i).unwrap_or(UNDEFINED)
}

fn num(args: &[Value], i: usize) -> f64 {
    arg(args, i).to_number()
}

/// Call a native other than `append`, which needs the environment.
///
/// # Errors
///
/// Returns `ScriptErrorKind::Type` when a native is misused.
pub fn call_native(native: Native, args: &[Value]) -> Result<Value, ScriptErrorKind> {
    let value = match native {
        Native::Append => {
            return Err(ScriptErrorKind::Type(
                "append called outside a template run".to_string(),
            ));
        }
        Native::String => Value::Str(args.first().map(Value::to_display).unwrap_or_default()),
        Native::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
        Native::Boolean => Value::Bool(arg(args, 0).is_truthy()),
        Native::ParseInt => {
            let radix = match arg(args, 1) {
                Value::Undefined => 10,
                other => radix(other.to_number())?,
            };
            Value::Number(parse_int(&arg(args, 0).to_display(), radix))
        }
        Native::ParseFloat => Value::Number(parse_float(&arg(args, 0).to_display())),
        Native::IsNaN => Value::Bool(num(args, 0).is_nan()),
        Native::Floor => Value::Number(num(args, 0).floor()),
        Native::Ceil => Value::Number(num(args, 0).ceil()),
        // halves round towards positive infinity
        Native::Round => {
            let x = num(args, 0);
            let floor = x.floor();
            Value::Number(if x - floor >= 0.5 { floor + 1.0 } else { floor })
        }
        Native::Trunc => Value::Number(num(args, 0).trunc()),
        Native::Abs => Value::Number(num(args, 0).abs()),
        Native::Min => Value::Number(fold_numbers(args, f64::INFINITY, f64::min)),
        Native::Max => Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)),
        Native::Pow => Value::Number(num(args, 0).powf(num(args, 1))),
        Native::Sqrt => Value::Number(num(args, 0).sqrt()),
        Native::Stringify => match arg(args, 0) {
            Value::Undefined | Value::Function(_) | Value::Native(_) => Value::Undefined,
            other => Value::Str(other.to_json().to_string()),
        },
    };
    Ok(value)
}

fn fold_numbers(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).fold(init, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            f(acc, n)
        }
    })
}

fn radix(n: f64) -> Result<u32, ScriptErrorKind> {
    if (2.0..=36.0).contains(&n) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let radix = n as u32;
        Ok(radix)
    } else {
        Err(ScriptErrorKind::Type(format!(
            "radix must be between 2 and 36, got {}",
            format_number(n)
        )))
    }
}

/// Leading integer of `text` in `radix`, `NaN` when there is none.
fn parse_int(text: &str, radix: u32) -> f64 {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let mut value: Option<f64> = None;
    for d in digits.chars().map_while(|c| c.to_digit(radix)) {
        value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(d));
    }
    value.map_or(f64::NAN, |v| sign * v)
}

/// Longest numeric prefix of `text`, `NaN` when there is none.
fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    if text.starts_with("Infinity") || text.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if text.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }
    let end = text
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    (1..=end)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn index_of(len: usize, n: f64) -> Option<usize> {
    if n.fract() != 0.0 || n < 0.0 || n >= count(len) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let i = n as usize;
    Some(i)
}

/// Resolve a `slice`-style bound: negative counts from the end.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn relative_bound(value: &Value, len: usize, default: usize) -> usize {
    if value.is_nullish() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

/// Read `receiver.name`.
///
/// # Errors
///
/// Returns `ScriptErrorKind::Type` when the receiver is `null` or
/// `undefined`.
pub fn get_member(receiver: &Value, name: &str) -> Result<Value, ScriptErrorKind> {
    match (receiver, name) {
        (Value::Undefined | Value::Null, _) => Err(ScriptErrorKind::Type(format!(
            "cannot read property {name} of {receiver}"
        ))),
        (Value::Str(s), "length") => Ok(Value::from(count(s.chars().count()))),
        (Value::Array(items), "length") => Ok(Value::from(count(items.len()))),
        (Value::Object(map), _) => Ok(map.get(name).cloned().unwrap_or_default()),
        _ => Ok(Value::Undefined),
    }
}

/// Read `receiver[index]`.
///
/// # Errors
///
/// Returns `ScriptErrorKind::Type` when the receiver is `null` or
/// `undefined`.
pub fn get_index(receiver: &Value, index: &Value) -> Result<Value, ScriptErrorKind> {
    match (receiver, index) {
        (Value::Array(items), Value::Number(n)) => Ok(index_of(items.len(), *n)
            .map(|i| items[i].clone())
            .unwrap_or_default()),
        (Value::Str(s), Value::Number(n)) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(index_of(chars.len(), *n)
                .map(|i| Value::Str(chars[i].to_string()))
                .unwrap_or_default())
        }
        _ => get_member(receiver, &index.to_display()),
    }
}

#[allow(clippy::cast_precision_loss)]
const fn count(n: usize) -> f64 {
    n as f64
}

/// Store `value` at `slot[key]`, growing arrays as needed.
///
/// # Errors
///
/// Returns `ScriptErrorKind::Type` for receivers that cannot hold
/// members, array indices that are not non-negative integers, or
/// indices too far past the end of the array.
pub fn set_index(slot: &mut Value, key: &Value, value: Value) -> Result<(), ScriptErrorKind> {
    match (slot, key) {
        (Value::Array(items), Value::Number(n)) => {
            if n.fract() != 0.0 || *n < 0.0 {
                return Err(ScriptErrorKind::Type(format!(
                    "invalid array index {}",
                    format_number(*n)
                )));
            }
            if *n > count(items.len().saturating_add(MAX_ARRAY_GAP)) {
                return Err(ScriptErrorKind::Type("invalid array length".into()));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let i = *n as usize;
            if i >= items.len() {
                items.resize(i + 1, Value::Undefined);
            }
            items[i] = value;
            Ok(())
        }
        (Value::Object(map), key) => {
            map.insert(key.to_display(), value);
            Ok(())
        }
        (other, key) => Err(ScriptErrorKind::Type(format!(
            "cannot set property {key} on {}",
            other.type_name()
        ))),
    }
}

/// Mutable reference to `slot[key]`, for nested assignment.
///
/// # Errors
///
/// Returns `ScriptErrorKind::Type` when the member does not exist.
pub fn index_mut<'v>(slot: &'v mut Value, key: &Value) -> Result<&'v mut Value, ScriptErrorKind> {
    let missing = || ScriptErrorKind::Type(format!("cannot set property of undefined ({key})"));
    match (slot, key) {
        (Value::Array(items), Value::Number(n)) => {
            let i = index_of(items.len(), *n).ok_or_else(missing)?;
            Ok(&mut items[i])
        }
        (Value::Object(map), key) => map.get_mut(&key.to_display()).ok_or_else(missing),
        _ => Err(missing()),
    }
}

/// Call a method that does not mutate its receiver.
///
/// # Errors
///
/// Returns `ScriptErrorKind::NotCallable` for unknown methods.
pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, ScriptErrorKind> {
    if name == "toString" && !receiver.is_nullish() {
        return Ok(Value::Str(receiver.to_display()));
    }

    let result = match receiver {
        Value::Str(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Number(n) => number_method(*n, name, args),
        _ => None,
    };

    match result {
        Some(value) => value,
        None if receiver.is_nullish() => Err(ScriptErrorKind::Type(format!(
            "cannot read property {name} of {receiver}"
        ))),
        None => Err(ScriptErrorKind::NotCallable(format!(
            "{}.{name}",
            receiver.type_name()
        ))),
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Result<Value, ScriptErrorKind>> {
    let text = |i| arg(args, i).to_display();
    let chars = || s.chars().collect::<Vec<_>>();

    let value = match name {
        "toUpperCase" => Value::Str(s.to_uppercase()),
        "toLowerCase" => Value::Str(s.to_lowercase()),
        "trim" => Value::Str(s.trim().to_string()),
        "trimStart" => Value::Str(s.trim_start().to_string()),
        "trimEnd" => Value::Str(s.trim_end().to_string()),
        "includes" => Value::Bool(s.contains(&text(0))),
        "startsWith" => Value::Bool(s.starts_with(&text(0))),
        "endsWith" => Value::Bool(s.ends_with(&text(0))),
        "indexOf" => {
            let needle = text(0);
            Value::Number(
                s.find(&needle)
                    .map_or(-1.0, |byte| count(s[..byte].chars().count())),
            )
        }
        "charAt" => {
            let chars = chars();
            Value::Str(
                index_of(chars.len(), arg(args, 0).to_number().trunc())
                    .map(|i| chars[i].to_string())
                    .unwrap_or_default(),
            )
        }
        "slice" => {
            let chars = chars();
            let start = relative_bound(arg(args, 0), chars.len(), 0);
            let end = relative_bound(arg(args, 1), chars.len(), chars.len());
            Value::Str(chars.get(start..end.max(start)).unwrap_or_default().iter().collect())
        }
        "split" => match arg(args, 0) {
            Value::Undefined => Value::Array(vec![Value::from(s)]),
            sep => {
                let sep = sep.to_display();
                if sep.is_empty() {
                    Value::Array(s.chars().map(|c| Value::Str(c.to_string())).collect())
                } else {
                    Value::Array(s.split(sep.as_str()).map(Value::from).collect())
                }
            }
        },
        "replace" => Value::Str(s.replacen(&text(0), &text(1), 1)),
        "replaceAll" => Value::Str(s.replace(&text(0), &text(1))),
        "repeat" => {
            let n = arg(args, 0).to_number();
            if n < 0.0 || n.is_infinite() {
                return Some(Err(ScriptErrorKind::Type(format!(
                    "invalid repeat count {}",
                    format_number(n)
                ))));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = n as usize;
            match s.len().checked_mul(n) {
                Some(len) if len <= MAX_STRING_LENGTH => Value::Str(s.repeat(n)),
                _ => return Some(Err(invalid_string_length())),
            }
        }
        "padStart" | "padEnd" => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let width = arg(args, 0).to_number().max(0.0) as usize;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_display(),
            };
            let len = s.chars().count();
            if width <= len || fill.is_empty() {
                Value::from(s)
            } else if width > MAX_STRING_LENGTH {
                return Some(Err(invalid_string_length()));
            } else {
                let pad: String = fill.chars().cycle().take(width - len).collect();
                if name == "padStart" {
                    Value::Str(pad + s)
                } else {
                    Value::Str(s.to_string() + &pad)
                }
            }
        }
        _ => return None,
    };
    Some(Ok(value))
}

fn array_method(
    items: &[Value],
    name: &str,
    args: &[Value],
) -> Option<Result<Value, ScriptErrorKind>> {
    let value = match name {
        "join" => {
            let sep = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_display(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_display()
                    }
                })
                .collect();
            Value::Str(parts.join(&sep))
        }
        "includes" => Value::Bool(items.iter().any(|v| v.strict_equals(arg(args, 0)))),
        "indexOf" => Value::Number(
            items
                .iter()
                .position(|v| v.strict_equals(arg(args, 0)))
                .map_or(-1.0, count),
        ),
        "slice" => {
            let start = relative_bound(arg(args, 0), items.len(), 0);
            let end = relative_bound(arg(args, 1), items.len(), items.len());
            Value::Array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
        // without a place to write back to, these only report their result
        "push" => Value::from(count(items.len() + args.len())),
        "pop" => items.last().cloned().unwrap_or_default(),
        _ => return None,
    };
    Some(Ok(value))
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Option<Result<Value, ScriptErrorKind>> {
    match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits };
            if !(0.0..=100.0).contains(&digits) {
                return Some(Err(ScriptErrorKind::Type(format!(
                    "toFixed digits must be between 0 and 100, got {}",
                    format_number(digits)
                ))));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let digits = digits as usize;
            Some(Ok(Value::Str(format!("{n:.digits$}"))))
        }
        _ => None,
    }
}
