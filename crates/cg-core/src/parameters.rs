//! Typed key → value parameter store handed to every plugin instance.
//!
//! Values are scalars, vectors, a bounded normal distribution, or a list of
//! nested parameter sets (used e.g. for sensor links).  Typed getters fail
//! with [`CoreError::ParameterType`] instead of silently coercing.

use std::collections::BTreeMap;

use crate::{CoreError, CoreResult};

// ── NormalDistribution ────────────────────────────────────────────────────────

/// A normal distribution truncated to `[min, max]`.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalDistribution {
    pub mean:    f64,
    pub std_dev: f64,
    pub min:     f64,
    pub max:     f64,
}

impl NormalDistribution {
    pub fn new(mean: f64, std_dev: f64, min: f64, max: f64) -> CoreResult<Self> {
        if std_dev < 0.0 || !std_dev.is_finite() {
            return Err(CoreError::Distribution(format!("standard deviation {std_dev}")));
        }
        if min > max {
            return Err(CoreError::Distribution(format!("min {min} exceeds max {max}")));
        }
        Ok(Self { mean, std_dev, min, max })
    }

    /// Clamp `value` into `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// ── ParameterValue ────────────────────────────────────────────────────────────

/// One stored parameter value.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    BoolVector(Vec<bool>),
    IntVector(Vec<i32>),
    DoubleVector(Vec<f64>),
    StringVector(Vec<String>),
    NormalDistribution(NormalDistribution),
    List(Vec<ParameterSet>),
}

impl ParameterValue {
    /// Human-readable variant name used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_)               => "bool",
            ParameterValue::Int(_)                => "int",
            ParameterValue::Double(_)             => "double",
            ParameterValue::String(_)             => "string",
            ParameterValue::BoolVector(_)         => "bool vector",
            ParameterValue::IntVector(_)          => "int vector",
            ParameterValue::DoubleVector(_)       => "double vector",
            ParameterValue::StringVector(_)       => "string vector",
            ParameterValue::NormalDistribution(_) => "normal distribution",
            ParameterValue::List(_)               => "list",
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(v: $ty) -> Self {
                    ParameterValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_value! {
    bool                => Bool,
    i32                 => Int,
    f64                 => Double,
    String              => String,
    Vec<bool>           => BoolVector,
    Vec<i32>            => IntVector,
    Vec<f64>            => DoubleVector,
    Vec<String>         => StringVector,
    NormalDistribution  => NormalDistribution,
    Vec<ParameterSet>   => List,
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::String(v.to_owned())
    }
}

// ── ParameterSet ──────────────────────────────────────────────────────────────

/// Ordered map of named parameter values.
///
/// Ordering is by key so that debug output and iteration are deterministic.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

macro_rules! typed_getter {
    ($(#[$attr:meta])* $fn_name:ident, $variant:ident, $ret:ty, $expected:literal) => {
        $(#[$attr])*
        pub fn $fn_name(&self, key: &str) -> CoreResult<$ret> {
            match self.lookup(key)? {
                ParameterValue::$variant(v) => Ok(v),
                other => Err(CoreError::ParameterType {
                    key:      key.to_owned(),
                    expected: $expected,
                    found:    other.type_name(),
                }),
            }
        }
    };
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Option<ParameterValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParameterValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, key: &str) -> CoreResult<&ParameterValue> {
        self.values
            .get(key)
            .ok_or_else(|| CoreError::MissingParameter(key.to_owned()))
    }

    // ── Typed access ──────────────────────────────────────────────────────

    typed_getter!(bool, Bool, &bool, "bool");
    typed_getter!(int, Int, &i32, "int");
    typed_getter!(double, Double, &f64, "double");
    typed_getter!(
        /// String parameter, e.g. the driver profile's `Type`.
        string, String, &String, "string"
    );
    typed_getter!(bool_vector, BoolVector, &Vec<bool>, "bool vector");
    typed_getter!(int_vector, IntVector, &Vec<i32>, "int vector");
    typed_getter!(double_vector, DoubleVector, &Vec<f64>, "double vector");
    typed_getter!(string_vector, StringVector, &Vec<String>, "string vector");
    typed_getter!(normal_distribution, NormalDistribution, &NormalDistribution, "normal distribution");
    typed_getter!(
        /// Nested list of parameter sets.
        list, List, &Vec<ParameterSet>, "list"
    );
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
