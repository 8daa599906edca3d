// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Element data shared by the editor crates.
//!
//! Structures store elements as atomic numbers (`i16`), with `0` reserved for the dummy atom `X`
//! that marks attachment points in functional-group templates.  The free functions in this crate
//! therefore accept raw atomic numbers and fall back gracefully for the dummy and for elements
//! without tabulated data.

use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use static_assertions::const_assert_eq;
use std::collections::HashMap;
use std::mem;

/// Atomic number used for dummy (placeholder) atoms.
pub const DUMMY_ATOMIC_NUMBER: i16 = 0;

/// Symbol used for dummy atoms and for anything that is not a known element.
pub const DUMMY_SYMBOL: &str = "X";

/// Covalent radius used when an element has no tabulated value (and for dummy atoms).
pub const DEFAULT_COVALENT_RADIUS: f64 = 0.7;

#[allow(dead_code)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Element {
    Hydrogen = 1,
    Helium,
    Lithium,
    Beryllium,
    Boron,
    Carbon,
    Nitrogen,
    Oxygen,
    Fluorine,
    Neon,
    Sodium,
    Magnesium,
    Aluminium,
    Silicon,
    Phosphorus,
    Sulfur,
    Chlorine,
    Argon,
    Potassium,
    Calcium,
    Scandium,
    Titanium,
    Vanadium,
    Chromium,
    Manganese,
    Iron,
    Cobalt,
    Nickel,
    Copper,
    Zinc,
    Gallium,
    Germanium,
    Arsenic,
    Selenium,
    Bromine,
    Krypton,
    Rubidium,
    Strontium,
    Yttrium,
    Zirconium,
    Niobium,
    Molybdenum,
    Technetium,
    Ruthenium,
    Rhodium,
    Palladium,
    Silver,
    Cadmium,
    Indium,
    Tin,
    Antimony,
    Tellurium,
    Iodine,
    Xenon,
    Cesium,
    Barium,
    Lanthanum,
    Cerium,
    Praseodymium,
    Neodymium,
    Promethium,
    Samarium,
    Europium,
    Gadolinium,
    Terbium,
    Dysprosium,
    Holmium,
    Erbium,
    Thulium,
    Ytterbium,
    Lutetium,
    Hafnium,
    Tantalum,
    Tungsten,
    Rhenium,
    Osmium,
    Iridium,
    Platinum,
    Gold,
    Mercury,
    Thallium,
    Lead,
    Bismuth,
    Polonium,
    Astatine,
    Radon,
    Francium,
    Radium,
    Actinium,
    Thorium,
    Protactinium,
    Uranium,
    Neptunium,
    Plutonium,
    Americium,
    Curium,
    Berkelium,
    Californium,
    Einsteinium,
    Fermium,
    Mendelevium,
    Nobelium,
    Lawrencium,
    Rutherfordium,
    Dubnium,
    Seaborgium,
    Bohrium,
    Hassium,
    Meitnerium,
    Darmstadtium,
    Roentgenium,
    Copernicium,
    Nihonium,
    Flerovium,
    Moscovium,
    Livermorium,
    Tennessine,
    Oganesson,
}

impl Element {
    pub const MIN: Self = Element::Hydrogen;
    pub const MAX: Self = Element::Oganesson;

    pub fn from_atomic_number(n: u8) -> Option<Self> {
        if n >= Self::MIN as u8 && n <= Self::MAX as u8 {
            // SAFETY: `Element` is `repr(u8)` with contiguous discriminants `MIN..=MAX`.
            Some(unsafe { mem::transmute::<u8, Element>(n) })
        } else {
            None
        }
    }

    /// Looks up an element by symbol, ignoring case (`"cl"`, `"CL"` and `"Cl"` all match).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        SYMBOL_TO_ATOMIC_NUMBER
            .get(&symbol.trim().to_ascii_uppercase())
            .and_then(|&n| Self::from_atomic_number(n))
    }

    pub fn atomic_number(self) -> u8 {
        self as u8
    }

    fn data(self) -> &'static ElementData {
        &ELEMENT_DATA[self as usize - 1]
    }

    pub fn symbol(self) -> &'static str {
        self.data().symbol
    }

    pub fn name(self) -> &'static str {
        self.data().name
    }

    /// Single-bond covalent radius in Ångströms.
    pub fn covalent_radius(self) -> f64 {
        self.data().covalent_radius.unwrap_or(DEFAULT_COVALENT_RADIUS)
    }

    /// The usual number of covalent bonds for main-group elements.  `None` for elements whose
    /// bonding is not well described by a single valence (transition metals, f-block).
    pub fn typical_valence(self) -> Option<u8> {
        self.data().valence
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Element::from_symbol(&symbol)
            .ok_or_else(|| de::Error::custom(format!("unknown element symbol '{}'", symbol)))
    }
}

/// Returns the symbol for an atomic number, `"X"` for the dummy atom or anything unknown.
pub fn symbol(atomic_number: i16) -> &'static str {
    element(atomic_number).map_or(DUMMY_SYMBOL, Element::symbol)
}

/// Returns the covalent radius for an atomic number, falling back to
/// [`DEFAULT_COVALENT_RADIUS`].
pub fn covalent_radius(atomic_number: i16) -> f64 {
    element(atomic_number).map_or(DEFAULT_COVALENT_RADIUS, Element::covalent_radius)
}

/// Returns the typical valence for an atomic number, if one is tabulated.
pub fn typical_valence(atomic_number: i16) -> Option<u8> {
    element(atomic_number).and_then(Element::typical_valence)
}

/// Parses an element symbol into an atomic number.  `"X"` maps to the dummy atom.
pub fn atomic_number_from_symbol(symbol: &str) -> Option<i16> {
    if symbol.trim().eq_ignore_ascii_case(DUMMY_SYMBOL) {
        return Some(DUMMY_ATOMIC_NUMBER);
    }
    Element::from_symbol(symbol).map(|e| e.atomic_number() as i16)
}

fn element(atomic_number: i16) -> Option<Element> {
    u8::try_from(atomic_number)
        .ok()
        .and_then(Element::from_atomic_number)
}

struct ElementData {
    symbol: &'static str,
    name: &'static str,
    covalent_radius: Option<f64>,
    valence: Option<u8>,
}

/// Covalent radii source: https://periodictable.com/Properties/A/CovalentRadius.v.log.html
const ELEMENT_DATA: [ElementData; 118] = [
    ElementData { symbol: "H", name: "Hydrogen", covalent_radius: Some(0.31), valence: Some(1) },
    ElementData { symbol: "He", name: "Helium", covalent_radius: Some(0.28), valence: Some(0) },
    ElementData { symbol: "Li", name: "Lithium", covalent_radius: Some(1.28), valence: Some(1) },
    ElementData { symbol: "Be", name: "Beryllium", covalent_radius: Some(0.96), valence: Some(2) },
    ElementData { symbol: "B", name: "Boron", covalent_radius: Some(0.85), valence: Some(3) },
    ElementData { symbol: "C", name: "Carbon", covalent_radius: Some(0.76), valence: Some(4) },
    ElementData { symbol: "N", name: "Nitrogen", covalent_radius: Some(0.71), valence: Some(3) },
    ElementData { symbol: "O", name: "Oxygen", covalent_radius: Some(0.66), valence: Some(2) },
    ElementData { symbol: "F", name: "Fluorine", covalent_radius: Some(0.57), valence: Some(1) },
    ElementData { symbol: "Ne", name: "Neon", covalent_radius: Some(0.58), valence: Some(0) },
    ElementData { symbol: "Na", name: "Sodium", covalent_radius: Some(1.66), valence: Some(1) },
    ElementData { symbol: "Mg", name: "Magnesium", covalent_radius: Some(1.41), valence: Some(2) },
    ElementData { symbol: "Al", name: "Aluminium", covalent_radius: Some(1.21), valence: Some(3) },
    ElementData { symbol: "Si", name: "Silicon", covalent_radius: Some(1.11), valence: Some(4) },
    ElementData { symbol: "P", name: "Phosphorus", covalent_radius: Some(1.07), valence: Some(3) },
    ElementData { symbol: "S", name: "Sulfur", covalent_radius: Some(1.05), valence: Some(2) },
    ElementData { symbol: "Cl", name: "Chlorine", covalent_radius: Some(1.02), valence: Some(1) },
    ElementData { symbol: "Ar", name: "Argon", covalent_radius: Some(1.06), valence: Some(0) },
    ElementData { symbol: "K", name: "Potassium", covalent_radius: Some(2.03), valence: Some(1) },
    ElementData { symbol: "Ca", name: "Calcium", covalent_radius: Some(1.76), valence: Some(2) },
    ElementData { symbol: "Sc", name: "Scandium", covalent_radius: Some(1.7), valence: None },
    ElementData { symbol: "Ti", name: "Titanium", covalent_radius: Some(1.6), valence: None },
    ElementData { symbol: "V", name: "Vanadium", covalent_radius: Some(1.53), valence: None },
    ElementData { symbol: "Cr", name: "Chromium", covalent_radius: Some(1.39), valence: None },
    ElementData { symbol: "Mn", name: "Manganese", covalent_radius: Some(1.39), valence: None },
    ElementData { symbol: "Fe", name: "Iron", covalent_radius: Some(1.32), valence: None },
    ElementData { symbol: "Co", name: "Cobalt", covalent_radius: Some(1.26), valence: None },
    ElementData { symbol: "Ni", name: "Nickel", covalent_radius: Some(1.24), valence: None },
    ElementData { symbol: "Cu", name: "Copper", covalent_radius: Some(1.32), valence: None },
    ElementData { symbol: "Zn", name: "Zinc", covalent_radius: Some(1.22), valence: Some(2) },
    ElementData { symbol: "Ga", name: "Gallium", covalent_radius: Some(1.22), valence: Some(3) },
    ElementData { symbol: "Ge", name: "Germanium", covalent_radius: Some(1.2), valence: Some(4) },
    ElementData { symbol: "As", name: "Arsenic", covalent_radius: Some(1.19), valence: Some(3) },
    ElementData { symbol: "Se", name: "Selenium", covalent_radius: Some(1.2), valence: Some(2) },
    ElementData { symbol: "Br", name: "Bromine", covalent_radius: Some(1.2), valence: Some(1) },
    ElementData { symbol: "Kr", name: "Krypton", covalent_radius: Some(1.16), valence: Some(0) },
    ElementData { symbol: "Rb", name: "Rubidium", covalent_radius: Some(2.2), valence: Some(1) },
    ElementData { symbol: "Sr", name: "Strontium", covalent_radius: Some(1.95), valence: Some(2) },
    ElementData { symbol: "Y", name: "Yttrium", covalent_radius: Some(1.9), valence: None },
    ElementData { symbol: "Zr", name: "Zirconium", covalent_radius: Some(1.75), valence: None },
    ElementData { symbol: "Nb", name: "Niobium", covalent_radius: Some(1.64), valence: None },
    ElementData { symbol: "Mo", name: "Molybdenum", covalent_radius: Some(1.54), valence: None },
    ElementData { symbol: "Tc", name: "Technetium", covalent_radius: Some(1.47), valence: None },
    ElementData { symbol: "Ru", name: "Ruthenium", covalent_radius: Some(1.46), valence: None },
    ElementData { symbol: "Rh", name: "Rhodium", covalent_radius: Some(1.42), valence: None },
    ElementData { symbol: "Pd", name: "Palladium", covalent_radius: Some(1.39), valence: None },
    ElementData { symbol: "Ag", name: "Silver", covalent_radius: Some(1.45), valence: None },
    ElementData { symbol: "Cd", name: "Cadmium", covalent_radius: Some(1.44), valence: Some(2) },
    ElementData { symbol: "In", name: "Indium", covalent_radius: Some(1.42), valence: Some(3) },
    ElementData { symbol: "Sn", name: "Tin", covalent_radius: Some(1.39), valence: Some(4) },
    ElementData { symbol: "Sb", name: "Antimony", covalent_radius: Some(1.39), valence: Some(3) },
    ElementData { symbol: "Te", name: "Tellurium", covalent_radius: Some(1.38), valence: Some(2) },
    ElementData { symbol: "I", name: "Iodine", covalent_radius: Some(1.39), valence: Some(1) },
    ElementData { symbol: "Xe", name: "Xenon", covalent_radius: Some(1.4), valence: Some(0) },
    ElementData { symbol: "Cs", name: "Cesium", covalent_radius: Some(2.44), valence: Some(1) },
    ElementData { symbol: "Ba", name: "Barium", covalent_radius: Some(2.15), valence: Some(2) },
    ElementData { symbol: "La", name: "Lanthanum", covalent_radius: Some(2.07), valence: None },
    ElementData { symbol: "Ce", name: "Cerium", covalent_radius: Some(2.04), valence: None },
    ElementData { symbol: "Pr", name: "Praseodymium", covalent_radius: Some(2.03), valence: None },
    ElementData { symbol: "Nd", name: "Neodymium", covalent_radius: Some(2.01), valence: None },
    ElementData { symbol: "Pm", name: "Promethium", covalent_radius: Some(1.99), valence: None },
    ElementData { symbol: "Sm", name: "Samarium", covalent_radius: Some(1.98), valence: None },
    ElementData { symbol: "Eu", name: "Europium", covalent_radius: Some(1.98), valence: None },
    ElementData { symbol: "Gd", name: "Gadolinium", covalent_radius: Some(1.96), valence: None },
    ElementData { symbol: "Tb", name: "Terbium", covalent_radius: Some(1.94), valence: None },
    ElementData { symbol: "Dy", name: "Dysprosium", covalent_radius: Some(1.92), valence: None },
    ElementData { symbol: "Ho", name: "Holmium", covalent_radius: Some(1.92), valence: None },
    ElementData { symbol: "Er", name: "Erbium", covalent_radius: Some(1.89), valence: None },
    ElementData { symbol: "Tm", name: "Thulium", covalent_radius: Some(1.9), valence: None },
    ElementData { symbol: "Yb", name: "Ytterbium", covalent_radius: Some(1.87), valence: None },
    ElementData { symbol: "Lu", name: "Lutetium", covalent_radius: Some(1.87), valence: None },
    ElementData { symbol: "Hf", name: "Hafnium", covalent_radius: Some(1.75), valence: None },
    ElementData { symbol: "Ta", name: "Tantalum", covalent_radius: Some(1.7), valence: None },
    ElementData { symbol: "W", name: "Tungsten", covalent_radius: Some(1.62), valence: None },
    ElementData { symbol: "Re", name: "Rhenium", covalent_radius: Some(1.51), valence: None },
    ElementData { symbol: "Os", name: "Osmium", covalent_radius: Some(1.44), valence: None },
    ElementData { symbol: "Ir", name: "Iridium", covalent_radius: Some(1.41), valence: None },
    ElementData { symbol: "Pt", name: "Platinum", covalent_radius: Some(1.36), valence: None },
    ElementData { symbol: "Au", name: "Gold", covalent_radius: Some(1.36), valence: None },
    ElementData { symbol: "Hg", name: "Mercury", covalent_radius: Some(1.32), valence: Some(2) },
    ElementData { symbol: "Tl", name: "Thallium", covalent_radius: Some(1.45), valence: Some(3) },
    ElementData { symbol: "Pb", name: "Lead", covalent_radius: Some(1.46), valence: Some(4) },
    ElementData { symbol: "Bi", name: "Bismuth", covalent_radius: Some(1.48), valence: Some(3) },
    ElementData { symbol: "Po", name: "Polonium", covalent_radius: Some(1.4), valence: Some(2) },
    ElementData { symbol: "At", name: "Astatine", covalent_radius: Some(1.5), valence: Some(1) },
    ElementData { symbol: "Rn", name: "Radon", covalent_radius: Some(1.5), valence: Some(0) },
    ElementData { symbol: "Fr", name: "Francium", covalent_radius: Some(2.6), valence: Some(1) },
    ElementData { symbol: "Ra", name: "Radium", covalent_radius: Some(2.21), valence: Some(2) },
    ElementData { symbol: "Ac", name: "Actinium", covalent_radius: Some(2.15), valence: None },
    ElementData { symbol: "Th", name: "Thorium", covalent_radius: Some(2.06), valence: None },
    ElementData { symbol: "Pa", name: "Protactinium", covalent_radius: Some(2.0), valence: None },
    ElementData { symbol: "U", name: "Uranium", covalent_radius: Some(1.96), valence: None },
    ElementData { symbol: "Np", name: "Neptunium", covalent_radius: Some(1.9), valence: None },
    ElementData { symbol: "Pu", name: "Plutonium", covalent_radius: Some(1.87), valence: None },
    ElementData { symbol: "Am", name: "Americium", covalent_radius: Some(1.8), valence: None },
    ElementData { symbol: "Cm", name: "Curium", covalent_radius: Some(1.69), valence: None },
    ElementData { symbol: "Bk", name: "Berkelium", covalent_radius: None, valence: None },
    ElementData { symbol: "Cf", name: "Californium", covalent_radius: None, valence: None },
    ElementData { symbol: "Es", name: "Einsteinium", covalent_radius: None, valence: None },
    ElementData { symbol: "Fm", name: "Fermium", covalent_radius: None, valence: None },
    ElementData { symbol: "Md", name: "Mendelevium", covalent_radius: None, valence: None },
    ElementData { symbol: "No", name: "Nobelium", covalent_radius: None, valence: None },
    ElementData { symbol: "Lr", name: "Lawrencium", covalent_radius: None, valence: None },
    ElementData { symbol: "Rf", name: "Rutherfordium", covalent_radius: None, valence: None },
    ElementData { symbol: "Db", name: "Dubnium", covalent_radius: None, valence: None },
    ElementData { symbol: "Sg", name: "Seaborgium", covalent_radius: None, valence: None },
    ElementData { symbol: "Bh", name: "Bohrium", covalent_radius: None, valence: None },
    ElementData { symbol: "Hs", name: "Hassium", covalent_radius: None, valence: None },
    ElementData { symbol: "Mt", name: "Meitnerium", covalent_radius: None, valence: None },
    ElementData { symbol: "Ds", name: "Darmstadtium", covalent_radius: None, valence: None },
    ElementData { symbol: "Rg", name: "Roentgenium", covalent_radius: None, valence: None },
    ElementData { symbol: "Cn", name: "Copernicium", covalent_radius: None, valence: None },
    ElementData { symbol: "Nh", name: "Nihonium", covalent_radius: None, valence: None },
    ElementData { symbol: "Fl", name: "Flerovium", covalent_radius: None, valence: None },
    ElementData { symbol: "Mc", name: "Moscovium", covalent_radius: None, valence: None },
    ElementData { symbol: "Lv", name: "Livermorium", covalent_radius: None, valence: None },
    ElementData { symbol: "Ts", name: "Tennessine", covalent_radius: None, valence: None },
    ElementData { symbol: "Og", name: "Oganesson", covalent_radius: None, valence: None },
];

const_assert_eq!(ELEMENT_DATA.len(), Element::MAX as usize);

lazy_static! {
    /// Uppercase symbol to atomic number.
    static ref SYMBOL_TO_ATOMIC_NUMBER: HashMap<String, u8> = ELEMENT_DATA
        .iter()
        .enumerate()
        .map(|(i, data)| (data.symbol.to_ascii_uppercase(), (i + 1) as u8))
        .collect();
}


// End of File
