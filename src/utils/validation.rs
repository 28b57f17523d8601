//! 表单 / JSON 输入的通用解析与校验
//!
//! 写接口同时接受 `application/json` 和 `application/x-www-form-urlencoded`，
//! 表单里所有值都是字符串，所以数值字段统一先落到 [`FieldValue`] 再解析。

use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email regex is valid")
});

/// 数字或字符串形式的字段值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Text(v) => v.trim().to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

/// 空白字符串视为未提供
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 子串搜索词按原样使用（不去除空白），仅空字符串视为未提供
pub fn search_term(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn optional_text(value: Option<String>) -> Option<String> {
    non_empty(value.as_deref()).map(str::to_string)
}

pub fn required_text(value: Option<&str>, field: &str) -> AppResult<String> {
    non_empty(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::ValidationError(format!(
            "Invalid email address: {email}"
        )));
    }
    Ok(())
}

pub fn parse_optional_int(value: Option<&FieldValue>, field: &str) -> AppResult<Option<i32>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let text = value.as_text();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i32>()
        .map(Some)
        .map_err(|_| AppError::ValidationError(format!("{field} must be a whole number")))
}

pub fn parse_required_int(value: Option<&FieldValue>, field: &str) -> AppResult<i32> {
    parse_optional_int(value, field)?
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

/// 价格上限，与 NUMERIC(10, 2) 一致
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// 解析两位小数的价格，返回美分
pub fn parse_price_cents(value: Option<&FieldValue>) -> AppResult<i64> {
    let text = value.map(FieldValue::as_text).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::ValidationError("Price is required".to_string()));
    }
    let price = Decimal::from_str(&text)
        .map_err(|_| AppError::ValidationError(format!("Price must be a number: {text}")))?
        .normalize();
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::ValidationError(
            "Price must not be negative".to_string(),
        ));
    }
    if price.scale() > 2 {
        return Err(AppError::ValidationError(
            "Price must have at most two decimal places".to_string(),
        ));
    }
    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .filter(|cents| *cents <= MAX_PRICE_CENTS)
        .ok_or_else(|| {
            AppError::ValidationError("Price must not exceed 99999999.99".to_string())
        })
}

pub fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

pub fn parse_time(value: &str, field: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::ValidationError(format!("{field} must be a time in HH:MM format")))
}

/// 解析状态枚举，未提供时使用默认值
pub fn parse_status<T>(value: Option<&str>, default: T) -> AppResult<T>
where
    T: FromStr<Err = String>,
{
    match non_empty(value) {
        Some(v) => v.parse::<T>().map_err(AppError::ValidationError),
        None => Ok(default),
    }
}
