//! Sample values and the scripted walkthrough behind `bloblist demo`
//!
//! Mirrors the two intended usage styles side by side: direct
//! index-addressed access through [`IndexedObjectTable`], and list-style
//! access through [`CachedObjectList`] including the in-place-edit
//! reconciliation protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BlobTable, CachedObjectList, IndexedObjectTable, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

impl Person {
    pub fn new(first_name: &str, last_name: &str, age: u32) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}", self.first_name, self.last_name, self.age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: f64,
}

impl Product {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (${:.2})", self.name, self.price)
    }
}

pub fn sample_persons() -> Vec<Person> {
    vec![
        Person::new("Alice", "Moreau", 35),
        Person::new("Brian", "Chen", 28),
        Person::new("Carla", "Ivanova", 42),
        Person::new("Derek", "Okafor", 31),
    ]
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("Smartphone", 999.99),
        Product::new("Laptop", 1499.50),
        Product::new("Headphones", 199.99),
        Product::new("Tablet", 599.00),
    ]
}

fn print_persons(table: &IndexedObjectTable<'_, Person>) -> Result<()> {
    for (i, person) in table.get_all()?.iter().enumerate() {
        println!("   [{}] {}", i, person);
    }
    Ok(())
}

fn print_products(list: &CachedObjectList<'_, Product>) {
    for (i, product) in list.iter().enumerate() {
        println!("   [{}] {}", i, product);
    }
}

/// Scripted walkthrough over two demo tables
pub fn run(db: &BlobTable) -> Result<()> {
    println!("🚀 Bloblist demo: indexed table vs cached list");

    // ----- indexed table, every operation a store round trip -----

    let persons: IndexedObjectTable<'_, Person> = IndexedObjectTable::open(db, "PERSONS")?;
    persons.clear()?;

    println!("\n📦 Populating {} ...", persons.table_name());
    for person in sample_persons() {
        persons.add(&person)?;
    }
    print_persons(&persons)?;

    println!("\n🗑️  remove(1) shifts every later index");
    let removed = persons.remove(1)?;
    println!("   removed: {}", removed.map(|p| p.to_string()).unwrap_or_default());
    print_persons(&persons)?;

    println!("\n📝 set(1) overwrites in place");
    let previous = persons.set(1, &Person::new("Carla", "Ivanova", 43))?;
    println!("   previous: {}", previous.map(|p| p.to_string()).unwrap_or_default());
    print_persons(&persons)?;

    println!("\n🔎 get_range(0, 1):");
    for person in persons.get_range(0, 1)? {
        println!("   {}", person);
    }

    // ----- cached list, reads served from memory -----

    let mut products: CachedObjectList<'_, Product> = CachedObjectList::open(db, "PRODUCTS")?;
    products.clear()?;

    println!("\n📦 Populating {} ...", products.table_name());
    for product in sample_products() {
        products.add(product)?;
    }
    print_products(&products);

    println!("\n✏️  In-place discount, bypassing the write path");
    products.get_mut(0)?.price *= 0.9;
    println!("   cache now diverged (dirty: {})", products.is_dirty());
    print_products(&products);

    println!("\n🔄 refresh(): store wins, the edit is discarded");
    products.refresh()?;
    print_products(&products);

    println!("\n✏️  Same edit again, then save_changes(): cache wins");
    products.get_mut(0)?.price *= 0.9;
    products.save_changes()?;
    println!("   store now holds: {}", products.table().get(0)?.map(|p| p.to_string()).unwrap_or_default());

    println!("\n📊 Final state:");
    println!("   {}: {} rows", persons.table_name(), persons.size()?);
    println!("   {}: {} rows", products.table_name(), products.len());

    println!("\n✅ Demo complete");
    Ok(())
}
