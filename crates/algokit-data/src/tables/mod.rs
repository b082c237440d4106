//! Storage layouts implementing [`NumericTable`](crate::NumericTable)

mod aos;
mod csr;
mod diagonal;
mod homogen;
mod merged;
mod packed;
mod row_merged;
mod soa;

pub use aos::{AosField, AosNumericTable};
pub use csr::{CsrAccess, CsrBlockDescriptor, CsrNumericTable, CsrTableExt};
pub use diagonal::DiagonalNumericTable;
pub use homogen::HomogenNumericTable;
pub use merged::MergedNumericTable;
pub use packed::{PackedKind, PackedNumericTable};
pub use row_merged::RowMergedNumericTable;
pub use soa::SoaNumericTable;

use std::collections::HashMap;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};

use crate::buffer::SharedBuffer;
use crate::serialization::{tags, Constructor};

/// `n_rows * n_columns`, failing on overflow
pub(crate) fn element_count(n_rows: usize, n_columns: usize) -> Result<usize> {
    n_rows.checked_mul(n_columns).ok_or_else(|| {
        Error::new(ErrorKind::MemoryAllocationFailed)
            .with_detail(ErrorDetail::Row, n_rows)
            .with_detail(ErrorDetail::Column, n_columns)
            .into()
    })
}

/// A vector of `len` copies of `value`, reporting allocation failure
pub(crate) fn allocate_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| {
        Error::new(ErrorKind::MemoryAllocationFailed).with_detail(ErrorDetail::ExpectedValue, len)
    })?;
    data.resize(len, value);
    Ok(data)
}

/// Backing buffer, or `NullInput` when none is attached
pub(crate) fn attached<'a, T>(buffer: &'a Option<SharedBuffer<T>>, name: &str) -> Result<&'a SharedBuffer<T>> {
    buffer.as_ref().ok_or_else(|| Error::null_input(name).into())
}

/// Fail unless a caller buffer holds at least `needed` elements
pub(crate) fn check_buffer_len(actual: usize, needed: usize) -> Result<()> {
    if actual < needed {
        return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
            .with_detail(ErrorDetail::ExpectedValue, needed)
            .with_detail(ErrorDetail::ActualValue, actual)
            .into());
    }
    Ok(())
}

/// Fail if a dictionary does not describe `n_columns` columns
pub(crate) fn check_dictionary_width(dictionary: &crate::Dictionary, n_columns: usize) -> Result<()> {
    if dictionary.number_of_features() != n_columns {
        return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
            .with_detail(ErrorDetail::ArgumentName, "dictionary")
            .with_detail(ErrorDetail::ExpectedValue, n_columns)
            .with_detail(ErrorDetail::ActualValue, dictionary.number_of_features())
            .into());
    }
    Ok(())
}

macro_rules! register_typed {
    ($constructors:expr, $base:expr, $ctor:ident) => {
        $constructors.insert(tags::typed($base, DataType::F64), $ctor::<f64> as Constructor);
        $constructors.insert(tags::typed($base, DataType::F32), $ctor::<f32> as Constructor);
        $constructors.insert(tags::typed($base, DataType::I32), $ctor::<i32> as Constructor);
    };
}

pub(crate) fn register_builtin(constructors: &mut HashMap<u32, Constructor>) {
    use aos::aos_from_payload;
    use csr::csr_from_payload;
    use diagonal::diagonal_from_payload;
    use homogen::homogen_from_payload;
    use packed::packed_from_payload;
    use soa::soa_from_payload;

    register_typed!(constructors, tags::HOMOGEN_TABLE, homogen_from_payload);
    register_typed!(constructors, tags::SOA_TABLE, soa_from_payload);
    register_typed!(constructors, tags::CSR_TABLE, csr_from_payload);
    register_typed!(constructors, tags::PACKED_TABLE, packed_from_payload);
    register_typed!(constructors, tags::DIAGONAL_TABLE, diagonal_from_payload);
    constructors.insert(tags::AOS_TABLE, aos_from_payload);
    constructors.insert(tags::MERGED_TABLE, merged::merged_from_payload);
    constructors.insert(tags::ROW_MERGED_TABLE, row_merged::row_merged_from_payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count_overflow() {
        assert_eq!(element_count(3, 4).unwrap(), 12);
        let err = element_count(usize::MAX, 2).unwrap_err();
        assert!(err.contains(ErrorKind::MemoryAllocationFailed));
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let err = allocate_filled(usize::MAX / 2, 0.0f64).unwrap_err();
        assert!(err.contains(ErrorKind::MemoryAllocationFailed));
        assert_eq!(allocate_filled(3, 1i32).unwrap(), vec![1, 1, 1]);
    }

    #[test]
    fn test_detached_buffer() {
        let none: Option<SharedBuffer<f64>> = None;
        assert!(attached(&none, "data").unwrap_err().contains(ErrorKind::NullInput));
    }
}
