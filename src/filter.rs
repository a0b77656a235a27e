// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 参数过滤器
//!
//! 取请求参数时可以附带一个过滤器，把原始值转换为期望的形态：
//! 1. 类型转换：`Int`、`Float`、`Bool`、`String`、`Array`。
//! 2. 文本清洗：`Trimmed`、`Safe`（HTML 转义）、`Email`、`Url`、`Encoded`。
//! 3. `Number` 取整数的绝对值，`Raw` 原样返回。

use std::str::FromStr;

use serde_json::{Number, Value};

use crate::{
    exception::Exception,
    util::{html_escape, raw_url_encode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Raw,
    Int,
    Float,
    Bool,
    String,
    Array,
    Trimmed,
    Safe,
    Number,
    Email,
    Url,
    Encoded,
}

impl Filter {
    /// 按名称查找过滤器，兼容 `integer`、`double`、`boolean`、`escape` 等别名。
    pub fn from_name(name: &str) -> Option<Self> {
        let filter = match name.trim().to_lowercase().as_str() {
            "" | "raw" => Filter::Raw,
            "int" | "integer" => Filter::Int,
            "float" | "double" => Filter::Float,
            "bool" | "boolean" => Filter::Bool,
            "string" => Filter::String,
            "array" => Filter::Array,
            "trimmed" | "trim" => Filter::Trimmed,
            "safe" | "escape" => Filter::Safe,
            "number" => Filter::Number,
            "email" => Filter::Email,
            "url" => Filter::Url,
            "encoded" => Filter::Encoded,
            _ => return None,
        };
        Some(filter)
    }

    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Filter::Raw => value.clone(),
            Filter::Int => Value::from(to_int(value)),
            Filter::Float => Number::from_f64(to_float(value))
                .map(Value::Number)
                .unwrap_or_else(|| Value::from(0)),
            Filter::Bool => Value::Bool(to_bool(value)),
            Filter::String => Value::String(to_text(value)),
            Filter::Array => match value {
                Value::Array(_) | Value::Object(_) => value.clone(),
                Value::Null => Value::Array(Vec::new()),
                scalar => Value::Array(vec![scalar.clone()]),
            },
            Filter::Trimmed => Value::String(to_text(value).trim().to_string()),
            Filter::Safe => Value::String(html_escape(&to_text(value))),
            Filter::Number => Value::from(to_int(value).unsigned_abs()),
            Filter::Email => Value::String(retain(&to_text(value), is_email_char)),
            Filter::Url => Value::String(retain(&to_text(value), is_url_char)),
            Filter::Encoded => Value::String(raw_url_encode(&to_text(value))),
        }
    }
}

impl FromStr for Filter {
    type Err = Exception;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Exception::UnknownFilter(s.to_string()))
    }
}

fn to_int(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => leading_number(s) as i64,
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

fn to_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => leading_number(s),
        other => to_int(other) as f64,
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 取字符串开头的数字部分，例如 `"12abc"` 为 12，`" 3.5kg"` 为 3.5，没有数字时为 0。
fn leading_number(text: &str) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        let accepted = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (c == '.' && !seen_dot);
        if !accepted {
            break;
        }
        seen_dot |= c == '.';
        end = i + c.len_utf8();
    }
    text[..end].parse().unwrap_or(0.0)
}

fn retain(text: &str, keep: fn(char) -> bool) -> String {
    text.chars().filter(|c| keep(*c)).collect()
}

fn is_email_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
}

fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=".contains(c)
}
