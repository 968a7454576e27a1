//! Core domain types for the vending engine.

use std::cmp::Reverse;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use thiserror::Error;

use crate::Amount;

/// A closed, finite key domain that can be counted by an [`Inventory`](crate::Inventory).
pub trait Catalog: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Lowercase name used in reports and command scripts.
    fn name(&self) -> &'static str;
}

/// A name in a command script that matches no coin or product.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

/// Coin denominations accepted by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    Penny,
    Nickel,
    Dime,
    Quarter,
}

impl Coin {
    pub const fn denomination(self) -> Amount {
        match self {
            Coin::Penny => Amount::from_cents(1),
            Coin::Nickel => Amount::from_cents(5),
            Coin::Dime => Amount::from_cents(10),
            Coin::Quarter => Amount::from_cents(25),
        }
    }

    /// Every coin sorted by denomination, largest first.
    pub fn descending() -> Vec<Coin> {
        let mut coins = Self::ALL.to_vec();
        coins.sort_by_key(|coin| Reverse(coin.denomination()));
        coins
    }
}

impl Catalog for Coin {
    const ALL: &'static [Self] = &[Coin::Penny, Coin::Nickel, Coin::Dime, Coin::Quarter];

    fn name(&self) -> &'static str {
        match self {
            Coin::Penny => "penny",
            Coin::Nickel => "nickel",
            Coin::Dime => "dime",
            Coin::Quarter => "quarter",
        }
    }
}

impl FromStr for Coin {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "penny" => Ok(Coin::Penny),
            "nickel" | "nickle" => Ok(Coin::Nickel),
            "dime" => Ok(Coin::Dime),
            "quarter" => Ok(Coin::Quarter),
            _ => Err(UnknownName {
                kind: "coin",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Items sold by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    Coke,
    Pepsi,
    Soda,
}

impl Product {
    pub const fn price(self) -> Amount {
        match self {
            Product::Coke => Amount::from_cents(25),
            Product::Pepsi => Amount::from_cents(35),
            Product::Soda => Amount::from_cents(45),
        }
    }

    /// Name shown to customers.
    pub const fn display_name(self) -> &'static str {
        match self {
            Product::Coke => "Coke",
            Product::Pepsi => "Pepsi",
            Product::Soda => "Soda",
        }
    }
}

impl Catalog for Product {
    const ALL: &'static [Self] = &[Product::Coke, Product::Pepsi, Product::Soda];

    fn name(&self) -> &'static str {
        match self {
            Product::Coke => "coke",
            Product::Pepsi => "pepsi",
            Product::Soda => "soda",
        }
    }
}

impl FromStr for Product {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .copied()
            .find(|product| product.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "product",
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome of a successful purchase: the product and the change handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispensed {
    product: Product,
    change: Vec<Coin>,
}

impl Dispensed {
    pub fn new(product: Product, change: Vec<Coin>) -> Self {
        Self { product, change }
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn change(&self) -> &[Coin] {
        &self.change
    }

    /// Sum of the change denominations.
    pub fn change_total(&self) -> Amount {
        self.change.iter().map(|coin| coin.denomination()).sum()
    }

    pub fn into_parts(self) -> (Product, Vec<Coin>) {
        (self.product, self.change)
    }
}

/// A customer or operator action, the possible inputs of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Choose a product and learn its price.
    Select(Product),
    /// Deposit one coin.
    Insert(Coin),
    /// Take the selected product and any change.
    Collect,
    /// Abort and get the deposited balance back.
    Refund,
    /// Empty both inventories and zero the sales counter.
    Reset,
}

impl Command {
    /// Lowercase command name, as written in command scripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Select(_) => "select",
            Command::Insert(_) => "insert",
            Command::Collect => "collect",
            Command::Refund => "refund",
            Command::Reset => "reset",
        }
    }
}
