//! Dispatches a column operation to the concrete [`PageColumn<T>`] for that
//! column's [`TypeCode`] via a closed tagged union, not a trait object or
//! `dyn Any` — spec.md §5 forbids per-invocation type discovery on the hot
//! path, so the match arms below are the entire cost of dispatch, resolved
//! once per call at a fixed set of branches the compiler can inline.

use super::PageColumn;
use crate::value::{TypeCode, Value};

pub enum TypedColumn {
    Long(PageColumn<i64>),
    Int(PageColumn<i32>),
    Short(PageColumn<i16>),
    Byte(PageColumn<i8>),
    Bool(PageColumn<bool>),
    Char(PageColumn<char>),
    Float(PageColumn<f32>),
    Double(PageColumn<f64>),
    String(PageColumn<String>),
    Instant(PageColumn<i64>),
}

macro_rules! unsupported {
    ($op:expr, $code:expr) => {
        panic!("TypeCodeUnsupported: {} is not supported on a {:?} column", $op, $code)
    };
}

impl TypedColumn {
    pub fn new(type_code: TypeCode, page_size: usize, max_pages: usize, initial_pages: usize) -> Self {
        match type_code {
            TypeCode::Long => TypedColumn::Long(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Int => TypedColumn::Int(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Short => TypedColumn::Short(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Byte => TypedColumn::Byte(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Bool => TypedColumn::Bool(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Char => TypedColumn::Char(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Float => TypedColumn::Float(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Double => TypedColumn::Double(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::String => TypedColumn::String(PageColumn::new(page_size, max_pages, initial_pages)),
            TypeCode::Instant => TypedColumn::Instant(PageColumn::new(page_size, max_pages, initial_pages)),
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            TypedColumn::Long(_) => TypeCode::Long,
            TypedColumn::Int(_) => TypeCode::Int,
            TypedColumn::Short(_) => TypeCode::Short,
            TypedColumn::Byte(_) => TypeCode::Byte,
            TypedColumn::Bool(_) => TypeCode::Bool,
            TypedColumn::Char(_) => TypeCode::Char,
            TypedColumn::Float(_) => TypeCode::Float,
            TypedColumn::Double(_) => TypeCode::Double,
            TypedColumn::String(_) => TypeCode::String,
            TypedColumn::Instant(_) => TypeCode::Instant,
        }
    }

    pub fn published_count(&self) -> usize {
        match self {
            TypedColumn::Long(c) => c.published_count(),
            TypedColumn::Int(c) => c.published_count(),
            TypedColumn::Short(c) => c.published_count(),
            TypedColumn::Byte(c) => c.published_count(),
            TypedColumn::Bool(c) => c.published_count(),
            TypedColumn::Char(c) => c.published_count(),
            TypedColumn::Float(c) => c.published_count(),
            TypedColumn::Double(c) => c.published_count(),
            TypedColumn::String(c) => c.published_count(),
            TypedColumn::Instant(c) => c.published_count(),
        }
    }

    pub fn publish(&self, new_w: usize) {
        match self {
            TypedColumn::Long(c) => c.publish(new_w),
            TypedColumn::Int(c) => c.publish(new_w),
            TypedColumn::Short(c) => c.publish(new_w),
            TypedColumn::Byte(c) => c.publish(new_w),
            TypedColumn::Bool(c) => c.publish(new_w),
            TypedColumn::Char(c) => c.publish(new_w),
            TypedColumn::Float(c) => c.publish(new_w),
            TypedColumn::Double(c) => c.publish(new_w),
            TypedColumn::String(c) => c.publish(new_w),
            TypedColumn::Instant(c) => c.publish(new_w),
        }
    }

    pub fn set_null(&self, i: usize) {
        match self {
            TypedColumn::Long(c) => c.set_null(i),
            TypedColumn::Int(c) => c.set_null(i),
            TypedColumn::Short(c) => c.set_null(i),
            TypedColumn::Byte(c) => c.set_null(i),
            TypedColumn::Bool(c) => c.set_null(i),
            TypedColumn::Char(c) => c.set_null(i),
            TypedColumn::Float(c) => c.set_null(i),
            TypedColumn::Double(c) => c.set_null(i),
            TypedColumn::String(c) => c.set_null(i),
            TypedColumn::Instant(c) => c.set_null(i),
        }
    }

    pub fn is_present(&self, i: usize) -> bool {
        match self {
            TypedColumn::Long(c) => c.is_present(i),
            TypedColumn::Int(c) => c.is_present(i),
            TypedColumn::Short(c) => c.is_present(i),
            TypedColumn::Byte(c) => c.is_present(i),
            TypedColumn::Bool(c) => c.is_present(i),
            TypedColumn::Char(c) => c.is_present(i),
            TypedColumn::Float(c) => c.is_present(i),
            TypedColumn::Double(c) => c.is_present(i),
            TypedColumn::String(c) => c.is_present(i),
            TypedColumn::Instant(c) => c.is_present(i),
        }
    }

    /// Writes `v` at row `i`, or clears presence if `v` is `Value::Null`.
    /// Panics (`TypeCodeUnsupported`) if `v`'s variant does not match this
    /// column's type code — a caller presenting a mistyped tuple is a
    /// programming error, not a recoverable condition.
    pub fn set(&self, i: usize, v: &Value) {
        if v.is_null() {
            self.set_null(i);
            return;
        }
        match (self, v) {
            (TypedColumn::Long(c), Value::Long(x)) => c.set(i, *x),
            (TypedColumn::Int(c), Value::Int(x)) => c.set(i, *x),
            (TypedColumn::Short(c), Value::Short(x)) => c.set(i, *x),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.set(i, *x),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.set(i, *x),
            (TypedColumn::Char(c), Value::Char(x)) => c.set(i, *x),
            (TypedColumn::Float(c), Value::Float(x)) => c.set(i, *x),
            (TypedColumn::Double(c), Value::Double(x)) => c.set(i, *x),
            (TypedColumn::String(c), Value::String(x)) => c.set(i, x.clone()),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.set(i, *x),
            _ => unsupported!("set with mismatched value type", self.type_code()),
        }
    }

    pub fn get(&self, i: usize) -> Value {
        match self {
            TypedColumn::Long(c) => Value::Long(c.get(i)),
            TypedColumn::Int(c) => Value::Int(c.get(i)),
            TypedColumn::Short(c) => Value::Short(c.get(i)),
            TypedColumn::Byte(c) => Value::Byte(c.get(i)),
            TypedColumn::Bool(c) => Value::Bool(c.get(i)),
            TypedColumn::Char(c) => Value::Char(c.get(i)),
            TypedColumn::Float(c) => Value::Float(c.get(i)),
            TypedColumn::Double(c) => Value::Double(c.get(i)),
            TypedColumn::String(c) => Value::String(c.get(i)),
            TypedColumn::Instant(c) => Value::Instant(c.get(i)),
        }
    }

    pub fn scan_equals(&self, target: &Value, limit: usize) -> Vec<u32> {
        match (self, target) {
            (TypedColumn::Long(c), Value::Long(x)) => c.scan_equals(x, limit),
            (TypedColumn::Int(c), Value::Int(x)) => c.scan_equals(x, limit),
            (TypedColumn::Short(c), Value::Short(x)) => c.scan_equals(x, limit),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.scan_equals(x, limit),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.scan_equals(x, limit),
            (TypedColumn::Char(c), Value::Char(x)) => c.scan_equals(x, limit),
            (TypedColumn::Float(c), Value::Float(x)) => c.scan_equals(x, limit),
            (TypedColumn::Double(c), Value::Double(x)) => c.scan_equals(x, limit),
            (TypedColumn::String(c), Value::String(x)) => c.scan_equals(x, limit),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.scan_equals(x, limit),
            _ => unsupported!("scan_equals with mismatched value type", self.type_code()),
        }
    }

    pub fn scan_gt(&self, target: &Value, limit: usize) -> Vec<u32> {
        match (self, target) {
            (TypedColumn::Long(c), Value::Long(x)) => c.scan_gt(x, limit),
            (TypedColumn::Int(c), Value::Int(x)) => c.scan_gt(x, limit),
            (TypedColumn::Short(c), Value::Short(x)) => c.scan_gt(x, limit),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.scan_gt(x, limit),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.scan_gt(x, limit),
            (TypedColumn::Char(c), Value::Char(x)) => c.scan_gt(x, limit),
            (TypedColumn::Float(c), Value::Float(x)) => c.scan_gt(x, limit),
            (TypedColumn::Double(c), Value::Double(x)) => c.scan_gt(x, limit),
            (TypedColumn::String(c), Value::String(x)) => c.scan_gt(x, limit),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.scan_gt(x, limit),
            _ => unsupported!("scan_gt", self.type_code()),
        }
    }

    pub fn scan_ge(&self, target: &Value, limit: usize) -> Vec<u32> {
        match (self, target) {
            (TypedColumn::Long(c), Value::Long(x)) => c.scan_ge(x, limit),
            (TypedColumn::Int(c), Value::Int(x)) => c.scan_ge(x, limit),
            (TypedColumn::Short(c), Value::Short(x)) => c.scan_ge(x, limit),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.scan_ge(x, limit),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.scan_ge(x, limit),
            (TypedColumn::Char(c), Value::Char(x)) => c.scan_ge(x, limit),
            (TypedColumn::Float(c), Value::Float(x)) => c.scan_ge(x, limit),
            (TypedColumn::Double(c), Value::Double(x)) => c.scan_ge(x, limit),
            (TypedColumn::String(c), Value::String(x)) => c.scan_ge(x, limit),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.scan_ge(x, limit),
            _ => unsupported!("scan_ge", self.type_code()),
        }
    }

    pub fn scan_lt(&self, target: &Value, limit: usize) -> Vec<u32> {
        match (self, target) {
            (TypedColumn::Long(c), Value::Long(x)) => c.scan_lt(x, limit),
            (TypedColumn::Int(c), Value::Int(x)) => c.scan_lt(x, limit),
            (TypedColumn::Short(c), Value::Short(x)) => c.scan_lt(x, limit),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.scan_lt(x, limit),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.scan_lt(x, limit),
            (TypedColumn::Char(c), Value::Char(x)) => c.scan_lt(x, limit),
            (TypedColumn::Float(c), Value::Float(x)) => c.scan_lt(x, limit),
            (TypedColumn::Double(c), Value::Double(x)) => c.scan_lt(x, limit),
            (TypedColumn::String(c), Value::String(x)) => c.scan_lt(x, limit),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.scan_lt(x, limit),
            _ => unsupported!("scan_lt", self.type_code()),
        }
    }

    pub fn scan_le(&self, target: &Value, limit: usize) -> Vec<u32> {
        match (self, target) {
            (TypedColumn::Long(c), Value::Long(x)) => c.scan_le(x, limit),
            (TypedColumn::Int(c), Value::Int(x)) => c.scan_le(x, limit),
            (TypedColumn::Short(c), Value::Short(x)) => c.scan_le(x, limit),
            (TypedColumn::Byte(c), Value::Byte(x)) => c.scan_le(x, limit),
            (TypedColumn::Bool(c), Value::Bool(x)) => c.scan_le(x, limit),
            (TypedColumn::Char(c), Value::Char(x)) => c.scan_le(x, limit),
            (TypedColumn::Float(c), Value::Float(x)) => c.scan_le(x, limit),
            (TypedColumn::Double(c), Value::Double(x)) => c.scan_le(x, limit),
            (TypedColumn::String(c), Value::String(x)) => c.scan_le(x, limit),
            (TypedColumn::Instant(c), Value::Instant(x)) => c.scan_le(x, limit),
            _ => unsupported!("scan_le", self.type_code()),
        }
    }

    pub fn scan_between(&self, lo: &Value, hi: &Value, limit: usize) -> Vec<u32> {
        match (self, lo, hi) {
            (TypedColumn::Long(c), Value::Long(a), Value::Long(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Int(c), Value::Int(a), Value::Int(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Short(c), Value::Short(a), Value::Short(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Byte(c), Value::Byte(a), Value::Byte(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Bool(c), Value::Bool(a), Value::Bool(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Char(c), Value::Char(a), Value::Char(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Float(c), Value::Float(a), Value::Float(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Double(c), Value::Double(a), Value::Double(b)) => c.scan_between(a, b, limit),
            (TypedColumn::String(c), Value::String(a), Value::String(b)) => c.scan_between(a, b, limit),
            (TypedColumn::Instant(c), Value::Instant(a), Value::Instant(b)) => c.scan_between(a, b, limit),
            _ => unsupported!("scan_between", self.type_code()),
        }
    }

    pub fn scan_in(&self, targets: &[Value], limit: usize) -> Vec<u32> {
        if targets.is_empty() {
            return Vec::new();
        }
        macro_rules! collect {
            ($variant:ident) => {{
                let mut xs = Vec::with_capacity(targets.len());
                for t in targets {
                    match t {
                        Value::$variant(x) => xs.push(x.clone()),
                        _ => unsupported!("scan_in with mismatched value type", self.type_code()),
                    }
                }
                xs
            }};
        }
        match self {
            TypedColumn::Long(c) => c.scan_in(&collect!(Long), limit),
            TypedColumn::Int(c) => c.scan_in(&collect!(Int), limit),
            TypedColumn::Short(c) => c.scan_in(&collect!(Short), limit),
            TypedColumn::Byte(c) => c.scan_in(&collect!(Byte), limit),
            TypedColumn::Bool(c) => c.scan_in(&collect!(Bool), limit),
            TypedColumn::Char(c) => c.scan_in(&collect!(Char), limit),
            TypedColumn::Float(c) => c.scan_in(&collect!(Float), limit),
            TypedColumn::Double(c) => c.scan_in(&collect!(Double), limit),
            TypedColumn::String(c) => c.scan_in(&collect!(String), limit),
            TypedColumn::Instant(c) => c.scan_in(&collect!(Instant), limit),
        }
    }

    pub fn scan_equals_ignore_case(&self, target: &str, limit: usize) -> Vec<u32> {
        match self {
            TypedColumn::String(c) => c.scan_equals_ignore_case(target, limit),
            other => unsupported!("scan_equals_ignore_case", other.type_code()),
        }
    }

    pub fn scan_starts_with(&self, prefix: &str, limit: usize) -> Vec<u32> {
        match self {
            TypedColumn::String(c) => c.scan_starts_with(prefix, limit),
            other => unsupported!("scan_starts_with", other.type_code()),
        }
    }

    pub fn scan_ends_with(&self, suffix: &str, limit: usize) -> Vec<u32> {
        match self {
            TypedColumn::String(c) => c.scan_ends_with(suffix, limit),
            other => unsupported!("scan_ends_with", other.type_code()),
        }
    }
}
