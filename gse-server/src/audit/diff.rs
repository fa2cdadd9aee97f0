//! 数据追踪 JSON diff 计算
//!
//! 比较变更前后的 JSON 快照，生成字段级差异 (`[{field, from, to}]`)。
//! 嵌套对象递归比较，字段路径用 `.` 连接；浮点数使用容差比较。

use serde::Serialize;
use serde_json::Value;
use shared::models::{FieldChange, TargetType};
use std::collections::BTreeSet;

/// 浮点数比较容差 (REAL 列往返后的精度损失)
const FLOAT_EPSILON: f64 = 1e-9;

/// 所有资源都排除的字段
const ALWAYS_EXCLUDED: &[&str] = &["passwordHash", "password_hash", "password"];

/// 资源特定的排除字段（时间戳不算业务变更）
fn excluded_fields(target: TargetType) -> &'static [&'static str] {
    match target {
        TargetType::Teacher => &["updatedAt", "roleLevel"],
        TargetType::Attendance => &["updatedAt"],
        TargetType::Request => &["updatedAt"],
        TargetType::Holiday => &["updatedAt"],
        TargetType::Settings => &["updatedAt", "updatedBy"],
        TargetType::AuditAction => &[],
    }
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(fa), Some(fb)) => (fa - fb).abs() < FLOAT_EPSILON,
        _ => a == b,
    }
}

/// 递归比较两个 JSON 值是否相等（浮点数使用容差比较）
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, va)| b.get(k).is_some_and(|vb| values_equal(va, vb)))
        }
        _ => a == b,
    }
}

fn diff_recursive(from: &Value, to: &Value, path: &str, changes: &mut Vec<FieldChange>) {
    match (from, to) {
        (Value::Object(from_obj), Value::Object(to_obj)) => {
            // BTreeSet 保证输出顺序稳定
            let keys: BTreeSet<&String> = from_obj.keys().chain(to_obj.keys()).collect();
            for key in keys {
                let field = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let f = from_obj.get(key).unwrap_or(&Value::Null);
                let t = to_obj.get(key).unwrap_or(&Value::Null);
                diff_recursive(f, t, &field, changes);
            }
        }
        (f, t) => {
            if !values_equal(f, t) {
                changes.push(FieldChange {
                    field: path.to_string(),
                    from: f.clone(),
                    to: t.clone(),
                });
            }
        }
    }
}

fn strip_fields(value: &mut Value, target: TargetType) {
    if let Value::Object(obj) = value {
        for field in ALWAYS_EXCLUDED.iter().chain(excluded_fields(target)) {
            obj.remove(*field);
        }
    }
}

/// 生成快照，去掉敏感字段
///
/// 序列化失败时返回 `None` 并记录错误。
pub fn snapshot<T: Serialize>(value: &T, target: TargetType) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(mut json) => {
            if let Value::Object(obj) = &mut json {
                for field in ALWAYS_EXCLUDED {
                    obj.remove(*field);
                }
            }
            Some(json)
        }
        Err(e) => {
            tracing::error!(target_type = %target.as_str(), error = %e, "Failed to serialize tracking snapshot");
            None
        }
    }
}

/// 计算两个快照之间的字段变更
///
/// - create: `from = None`，每个字段记录 `null → value`
/// - delete: `to = None`，每个字段记录 `value → null`
pub fn diff(from: Option<&Value>, to: Option<&Value>, target: TargetType) -> Vec<FieldChange> {
    let empty = Value::Object(Default::default());
    let mut from = from.cloned().unwrap_or_else(|| empty.clone());
    let mut to = to.cloned().unwrap_or(empty);
    strip_fields(&mut from, target);
    strip_fields(&mut to, target);

    let mut changes = Vec::new();
    diff_recursive(&from, &to, "", &mut changes);
    changes
}
