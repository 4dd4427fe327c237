use crate::format::{format_quantity, QuantityFormat};
use crate::units::ConvertibleUnit;
use protocol::AccountSnapshot;

/// Latest value of two inputs. A pair is only available once both sides
/// have been set at least once; after that every update yields a new pair.
#[derive(Clone, Debug)]
pub struct CombineLatest<A, B> {
    left: Option<A>,
    right: Option<B>,
}

impl<A: Clone, B: Clone> CombineLatest<A, B> {
    pub fn new() -> Self {
        Self {
            left: None,
            right: None,
        }
    }

    pub fn set_left(&mut self, value: A) -> Option<(A, B)> {
        self.left = Some(value);
        self.current()
    }

    pub fn set_right(&mut self, value: B) -> Option<(A, B)> {
        self.right = Some(value);
        self.current()
    }

    pub fn clear_left(&mut self) {
        self.left = None;
    }

    pub fn current(&self) -> Option<(A, B)> {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => Some((left.clone(), right.clone())),
            _ => None,
        }
    }
}

impl<A: Clone, B: Clone> Default for CombineLatest<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

pub type Extractor = fn(&AccountSnapshot) -> u64;

/// One displayed quantity: raw counter from the latest snapshot combined with
/// the latest unit selection.
#[derive(Clone, Debug)]
pub struct QuantityField<U: ConvertibleUnit> {
    extract: Extractor,
    inputs: CombineLatest<u64, U>,
    value: String,
}

impl<U: ConvertibleUnit> QuantityField<U> {
    pub fn new(extract: Extractor, format: &QuantityFormat) -> Self {
        Self {
            extract,
            inputs: CombineLatest::new(),
            value: format.placeholder.clone(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn on_snapshot(&mut self, snapshot: &AccountSnapshot, format: &QuantityFormat) {
        let raw = (self.extract)(snapshot);
        if let Some((raw, unit)) = self.inputs.set_left(raw) {
            self.render(raw, unit, format);
        }
    }

    pub fn on_unit(&mut self, unit: U, format: &QuantityFormat) {
        if let Some((raw, unit)) = self.inputs.set_right(unit) {
            self.render(raw, unit, format);
        }
    }

    /// Overrides the output with the placeholder and forgets the raw value,
    /// so a later unit change cannot resurrect figures from before the error.
    pub fn on_error(&mut self, format: &QuantityFormat) {
        self.inputs.clear_left();
        self.value = format.placeholder.clone();
    }

    fn render(&mut self, raw: u64, unit: U, format: &QuantityFormat) {
        self.value = format_quantity(raw, U::base(), unit, format);
    }
}

#[derive(Clone, Debug)]
pub struct BalanceField {
    value: String,
}

impl BalanceField {
    pub fn new(format: &QuantityFormat) -> Self {
        Self {
            value: format.placeholder.clone(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn on_snapshot(&mut self, snapshot: &AccountSnapshot) {
        self.value = snapshot.core_liquid_balance.clone();
    }

    pub fn on_error(&mut self, format: &QuantityFormat) {
        self.value = format.placeholder.clone();
    }
}
