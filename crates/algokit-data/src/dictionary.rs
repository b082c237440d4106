//! Per-column metadata of a numeric table

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// Semantic type of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Continuous,
    Categorical,
    Ordinal,
}

/// Whether NaN and infinite values are accepted in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpecialValuePolicy {
    #[default]
    Allow,
    Reject,
}

/// Metadata for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub feature_type: FeatureType,
    pub data_type: DataType,
    pub special_values: SpecialValuePolicy,
    /// Number of categories; zero for continuous features
    pub category_count: usize,
}

impl FeatureInfo {
    pub fn continuous(data_type: DataType) -> Self {
        Self {
            feature_type: FeatureType::Continuous,
            data_type,
            special_values: SpecialValuePolicy::Allow,
            category_count: 0,
        }
    }

    pub fn categorical(data_type: DataType, category_count: usize) -> Self {
        Self {
            feature_type: FeatureType::Categorical,
            data_type,
            special_values: SpecialValuePolicy::Allow,
            category_count,
        }
    }

    pub fn with_special_values(mut self, policy: SpecialValuePolicy) -> Self {
        self.special_values = policy;
        self
    }

    /// Storage width in bytes
    pub fn storage_width(&self) -> usize {
        self.data_type.size_of()
    }
}

/// Ordered per-column metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dictionary {
    features: Vec<FeatureInfo>,
}

impl Dictionary {
    /// `n` continuous columns of one type
    pub fn homogeneous(n: usize, data_type: DataType) -> Self {
        Self {
            features: vec![FeatureInfo::continuous(data_type); n],
        }
    }

    pub fn from_features(features: Vec<FeatureInfo>) -> Self {
        Self { features }
    }

    /// Columns of several dictionaries side by side
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Dictionary>) -> Self {
        Self {
            features: parts
                .into_iter()
                .flat_map(|d| d.features.iter().cloned())
                .collect(),
        }
    }

    pub fn number_of_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, index: usize) -> Option<&FeatureInfo> {
        self.features.get(index)
    }

    pub fn features(&self) -> &[FeatureInfo] {
        &self.features
    }

    pub fn set_feature(&mut self, index: usize, info: FeatureInfo) -> Result<()> {
        let n = self.features.len();
        match self.features.get_mut(index) {
            Some(slot) => {
                *slot = info;
                Ok(())
            }
            None => Err(Error::new(ErrorKind::OutOfRange)
                .with_detail(ErrorDetail::Column, index)
                .with_detail(ErrorDetail::ExpectedValue, n)
                .into()),
        }
    }

    /// Whether any column rejects special values
    pub fn rejects_special_values(&self) -> bool {
        self.features
            .iter()
            .any(|f| f.special_values == SpecialValuePolicy::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_dictionary() {
        let d = Dictionary::homogeneous(3, DataType::F32);
        assert_eq!(d.number_of_features(), 3);
        assert_eq!(d.feature(2).unwrap().storage_width(), 4);
        assert!(d.feature(3).is_none());
        assert!(!d.rejects_special_values());
    }

    #[test]
    fn test_set_feature() {
        let mut d = Dictionary::homogeneous(2, DataType::F64);
        d.set_feature(
            1,
            FeatureInfo::categorical(DataType::I32, 4).with_special_values(SpecialValuePolicy::Reject),
        )
        .unwrap();
        assert_eq!(d.feature(1).unwrap().feature_type, FeatureType::Categorical);
        assert!(d.rejects_special_values());

        let err = d.set_feature(5, FeatureInfo::continuous(DataType::F64)).unwrap_err();
        assert!(err.contains(ErrorKind::OutOfRange));
    }

    #[test]
    fn test_concat() {
        let a = Dictionary::homogeneous(1, DataType::F64);
        let b = Dictionary::homogeneous(2, DataType::I32);
        let c = Dictionary::concat([&a, &b]);
        assert_eq!(c.number_of_features(), 3);
        assert_eq!(c.feature(2).unwrap().data_type, DataType::I32);
    }
}
