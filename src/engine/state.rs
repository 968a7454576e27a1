use crate::model::Product;

/// Where the machine stands in a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    /// No product chosen.
    #[default]
    Idle,
    /// A product is chosen; coins may be inserted.
    Selected(Product),
}

impl MachineState {
    pub fn product(&self) -> Option<Product> {
        match self {
            MachineState::Idle => None,
            MachineState::Selected(product) => Some(*product),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, MachineState::Idle)
    }
}
