//! Fixed-length sequences shared between execution units.
//!
//! See [`SharedSequence`].
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;

use crate::sync::{AtomicU64, Ordering};
use crate::{Error, Result};

/// The type of the elements stored in a [`SharedSequence`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ElementType {
    /// Returns the conventional one-character type code, e.g. `'i'` for a
    /// signed 32-bit integer.
    pub fn code(&self) -> char {
        match self {
            ElementType::Bool => '?',
            ElementType::I8 => 'b',
            ElementType::I16 => 'h',
            ElementType::I32 => 'i',
            ElementType::I64 => 'q',
            ElementType::U8 => 'B',
            ElementType::U16 => 'H',
            ElementType::U32 => 'I',
            ElementType::U64 => 'Q',
            ElementType::F32 => 'f',
            ElementType::F64 => 'd',
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A scalar that fits in 64 bits of atomic memory.
pub trait Element: Copy {
    /// The type tag of the element.
    const TYPE: ElementType;

    /// Encodes the element as 64 bits.
    fn into_bits(self) -> u64;

    /// Decodes an element previously encoded with [`into_bits`](Element::into_bits).
    fn from_bits(bits: u64) -> Self;
}

macro_rules! integer_element {
    ($($int:ty => $tag:ident,)*) => {
    $(
        impl Element for $int {
            const TYPE: ElementType = ElementType::$tag;

            fn into_bits(self) -> u64 {
                self as u64
            }

            fn from_bits(bits: u64) -> Self {
                bits as $int
            }
        }
    )*
    }
}

integer_element! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl Element for bool {
    const TYPE: ElementType = ElementType::Bool;

    fn into_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits != 0
    }
}

impl Element for f32 {
    const TYPE: ElementType = ElementType::F32;

    fn into_bits(self) -> u64 {
        self.to_bits() as u64
    }

    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::F64;

    fn into_bits(self) -> u64 {
        self.to_bits()
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

/// A fixed-length sequence of scalars living in memory shared between
/// execution units.
///
/// Each slot is an independent word of atomic memory, accessed with
/// sequentially consistent loads and stores. [`get`](SharedSequence::get) and
/// [`set`](SharedSequence::set) therefore never take a lock, and units writing
/// to *different* indices never interfere with each other.
///
/// Compound updates are another matter. Two units performing a read followed by
/// a write on the *same* index can lose an update, so work must be split into
/// disjoint ranges (see [`partition`](SharedSequence::partition)), or guarded
/// by an external lock such as a [`SharedRegister`](crate::SharedRegister).
///
/// The length is fixed at creation. Cloning produces another handle to the
/// same memory.
///
/// # Examples
///
/// Squaring each half of a sequence in its own unit.
///
/// ```
/// use procsync::{unit, SharedSequence};
///
/// let values = SharedSequence::new([1, 2, 3, 4]);
///
/// let units: Vec<_> = values
///     .partition(2)
///     .into_iter()
///     .enumerate()
///     .map(|(i, range)| {
///         let values = values.clone();
///         unit::spawn(format!("square-{i}"), move || values.map_in_place(range, |x| x * x))
///     })
///     .collect();
///
/// for unit in units {
///     unit.join().unwrap().unwrap();
/// }
/// assert_eq!(values.to_vec(), vec![1, 4, 9, 16]);
/// ```
pub struct SharedSequence<T: Element> {
    slots: Arc<[AtomicU64]>,
    _element_type: PhantomData<T>,
}

impl<T: Element> SharedSequence<T> {
    /// Creates a sequence holding `values`, in order.
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            slots: values
                .into_iter()
                .map(|value| AtomicU64::new(value.into_bits()))
                .collect(),
            _element_type: PhantomData,
        }
    }

    /// Returns the number of slots in the sequence.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the type tag of the elements.
    pub fn element_type(&self) -> ElementType {
        T::TYPE
    }

    /// Returns the value stored at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not in `[0, len)`.
    pub fn get(&self, index: usize) -> Result<T> {
        let slot = self.slot(index)?;
        Ok(T::from_bits(slot.load(Ordering::SeqCst)))
    }

    /// Stores `value` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not in `[0, len)`.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        let slot = self.slot(index)?;
        slot.store(value.into_bits(), Ordering::SeqCst);
        Ok(())
    }

    /// Replaces every value in `range` with the result of applying `f` to it.
    ///
    /// Each slot is read and then written separately, so the caller must make
    /// sure no other unit updates an overlapping range at the same time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `range` does not lie within
    /// `[0, len)`, in which case no slot is touched.
    pub fn map_in_place<F>(&self, range: Range<usize>, mut f: F) -> Result<()>
    where
        F: FnMut(T) -> T,
    {
        if range.start > range.end {
            return Err(self.out_of_range(range.start));
        }
        if range.end > self.len() {
            return Err(self.out_of_range(range.end));
        }
        for slot in &self.slots[range] {
            let value = T::from_bits(slot.load(Ordering::SeqCst));
            slot.store(f(value).into_bits(), Ordering::SeqCst);
        }
        Ok(())
    }

    /// Splits `[0, len)` into `parts` contiguous, disjoint ranges whose sizes
    /// differ by at most one.
    ///
    /// Some ranges are empty if `parts` exceeds the length of the sequence.
    ///
    /// ```
    /// use procsync::SharedSequence;
    ///
    /// let values = SharedSequence::new([0_u8; 5]);
    /// assert_eq!(values.partition(2), vec![0..3, 3..5]);
    /// ```
    pub fn partition(&self, parts: usize) -> Vec<Range<usize>> {
        if parts == 0 {
            return Vec::new();
        }
        let base = self.len() / parts;
        let remainder = self.len() % parts;
        let mut start = 0;
        (0..parts)
            .map(|i| {
                let size = if i < remainder { base + 1 } else { base };
                let range = start..start + size;
                start += size;
                range
            })
            .collect()
    }

    /// Returns the values currently stored in the sequence.
    ///
    /// Slots are read one at a time, so this is not an atomic snapshot of the
    /// whole sequence while other units are writing to it.
    pub fn to_vec(&self) -> Vec<T> {
        self.slots
            .iter()
            .map(|slot| T::from_bits(slot.load(Ordering::SeqCst)))
            .collect()
    }

    fn slot(&self, index: usize) -> Result<&AtomicU64> {
        self.slots
            .get(index)
            .ok_or_else(|| self.out_of_range(index))
    }

    fn out_of_range(&self, index: usize) -> Error {
        Error::IndexOutOfRange {
            index,
            len: self.len(),
        }
    }
}

impl<T: Element> FromIterator<T> for SharedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T: Element> Clone for SharedSequence<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            _element_type: PhantomData,
        }
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for SharedSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSequence")
            .field("element_type", &T::TYPE)
            .field("values", &self.to_vec())
            .finish()
    }
}
