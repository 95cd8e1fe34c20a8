//! Type codes and the dynamically-typed value that crosses the table/column
//! boundary. Every column carries exactly one [`TypeCode`]; the evaluator and
//! the table dispatch on it instead of doing per-invocation type discovery.

/// The fixed enum of primitive and boxable scalar kinds a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Long,
    Int,
    Short,
    Byte,
    Bool,
    Char,
    Float,
    Double,
    String,
    Instant,
}

/// A typed scalar. `Null` carries no type code of its own — it is only ever
/// produced for a nullable column slot whose presence bit is clear.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    Int(i32),
    Short(i16),
    Byte(i8),
    Bool(bool),
    Char(char),
    Float(f32),
    Double(f64),
    String(String),
    /// Milliseconds since the Unix epoch.
    Instant(i64),
    Null,
}

impl Value {
    pub fn type_code(&self) -> Option<TypeCode> {
        match self {
            Value::Long(_) => Some(TypeCode::Long),
            Value::Int(_) => Some(TypeCode::Int),
            Value::Short(_) => Some(TypeCode::Short),
            Value::Byte(_) => Some(TypeCode::Byte),
            Value::Bool(_) => Some(TypeCode::Bool),
            Value::Char(_) => Some(TypeCode::Char),
            Value::Float(_) => Some(TypeCode::Float),
            Value::Double(_) => Some(TypeCode::Double),
            Value::String(_) => Some(TypeCode::String),
            Value::Instant(_) => Some(TypeCode::Instant),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A value for the purposes of index keys and hashing. Floats are stored by
/// bit pattern so `IndexKey` can derive `Hash`/`Eq` (NaN is simply a distinct
/// bucket there), but `Ord`/`PartialOrd` are hand-written to compare the
/// reconstituted float numerically — a `BTreeMap<IndexKey, _>` must order a
/// Float/Double column by value, not by the bit pattern's unsigned integer
/// reading, or every negative value would sort after every positive one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Long(i64),
    Int(i32),
    Short(i16),
    Byte(i8),
    Bool(bool),
    Char(char),
    Float(u32),
    Double(u64),
    String(String),
    Instant(i64),
}

impl IndexKey {
    pub fn from_value(v: &Value) -> Option<Self> {
        Some(match v {
            Value::Long(x) => IndexKey::Long(*x),
            Value::Int(x) => IndexKey::Int(*x),
            Value::Short(x) => IndexKey::Short(*x),
            Value::Byte(x) => IndexKey::Byte(*x),
            Value::Bool(x) => IndexKey::Bool(*x),
            Value::Char(x) => IndexKey::Char(*x),
            Value::Float(x) => IndexKey::Float(x.to_bits()),
            Value::Double(x) => IndexKey::Double(x.to_bits()),
            Value::String(x) => IndexKey::String(x.clone()),
            Value::Instant(x) => IndexKey::Instant(*x),
            Value::Null => return None,
        })
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            IndexKey::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Declaration-order rank, used only to order keys across mismatched
    /// variants — never hit in practice since one column carries one
    /// `TypeCode`, but `Ord` must still be total.
    fn variant_rank(&self) -> u8 {
        match self {
            IndexKey::Long(_) => 0,
            IndexKey::Int(_) => 1,
            IndexKey::Short(_) => 2,
            IndexKey::Byte(_) => 3,
            IndexKey::Bool(_) => 4,
            IndexKey::Char(_) => 5,
            IndexKey::Float(_) => 6,
            IndexKey::Double(_) => 7,
            IndexKey::String(_) => 8,
            IndexKey::Instant(_) => 9,
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (IndexKey::Long(a), IndexKey::Long(b)) => a.cmp(b),
            (IndexKey::Int(a), IndexKey::Int(b)) => a.cmp(b),
            (IndexKey::Short(a), IndexKey::Short(b)) => a.cmp(b),
            (IndexKey::Byte(a), IndexKey::Byte(b)) => a.cmp(b),
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (IndexKey::Char(a), IndexKey::Char(b)) => a.cmp(b),
            (IndexKey::Float(a), IndexKey::Float(b)) => f32::from_bits(*a).total_cmp(&f32::from_bits(*b)),
            (IndexKey::Double(a), IndexKey::Double(b)) => f64::from_bits(*a).total_cmp(&f64::from_bits(*b)),
            (IndexKey::String(a), IndexKey::String(b)) => a.cmp(b),
            (IndexKey::Instant(a), IndexKey::Instant(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}
