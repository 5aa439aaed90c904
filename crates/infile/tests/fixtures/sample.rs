//! Customer / contact / product graph.
//!
//! A customer owns four products (one-to-many, each product points back
//! through a `customer_id` join column) and a contact sharing its primary key.
//! The contact keeps its phone number in the `contact_phone` secondary table.

use infile::prelude::*;
use infile::ymd_to_days;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const FIRST_NAME: &str = "John";
pub const LAST_NAME: &str = "Smith";
pub const PHONE: &str = "1234445566";
pub const PRODUCT_TITLE: &str = "Title of an awesome product";
pub const PRODUCT_DESCRIPTION: &str = "This is a short description about this product";
pub const PRODUCT_PRICE: &str = "1.23";

fn customer_schema() -> &'static EntitySchema {
    &CUSTOMER
}

fn contact_schema() -> &'static EntitySchema {
    &CONTACT
}

fn product_schema() -> &'static EntitySchema {
    &PRODUCT
}

pub static CUSTOMER: EntitySchema = EntitySchema::new("Customer")
    .table("customer")
    .identity(IdentityInfo::auto("id"))
    .columns(&[ColumnInfo::new("last_seen_on")])
    .relationships(&[
        RelationshipInfo::one_to_many("products", product_schema),
        RelationshipInfo::one_to_one("contact", contact_schema).primary_key_join(),
    ]);

pub static CONTACT: EntitySchema = EntitySchema::new("Contact")
    .table("contact")
    .identity(IdentityInfo::foreign("id").column("customer_id"))
    .secondary_tables(&[SecondaryTableInfo::new("contact_phone", &["customer_id"])])
    .columns(&[
        ColumnInfo::new("first_name"),
        ColumnInfo::new("last_name"),
        ColumnInfo::new("phone").table("contact_phone"),
    ])
    .relationships(&[RelationshipInfo::one_to_one("customer", customer_schema).primary_key_join()]);

pub static PRODUCT: EntitySchema = EntitySchema::new("Product")
    .table("product")
    .identity(IdentityInfo::auto("id"))
    .columns(&[
        ColumnInfo::new("title"),
        ColumnInfo::new("description").free_text(),
        ColumnInfo::new("price"),
        ColumnInfo::new("purchased_on"),
    ])
    .relationships(&[
        RelationshipInfo::many_to_one("customer", customer_schema).join_column("customer_id"),
    ]);

/// The calendar day every sample customer was last seen and every sample product bought.
pub fn sample_day() -> i32 {
    ymd_to_days(2012, 3, 14).expect("valid calendar date")
}

#[derive(Default)]
pub struct Customer {
    pub id: Option<i64>,
    pub last_seen_on: Option<i32>,
    pub products: Vec<Rc<RefCell<Product>>>,
    pub contact: Option<Rc<RefCell<Contact>>>,
}

#[derive(Default)]
pub struct Contact {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub customer: Weak<RefCell<Customer>>,
}

#[derive(Default)]
pub struct Product {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub purchased_on: Option<i32>,
    pub customer: Weak<RefCell<Customer>>,
}

fn upgrade<T: Entity + 'static>(weak: &Weak<RefCell<T>>) -> Related {
    match weak.upgrade() {
        Some(strong) => Related::One(strong as EntityRef),
        None => Related::None,
    }
}

fn date(days: Option<i32>) -> Value {
    days.map_or(Value::Null, Value::Date)
}

impl Customer {
    /// Attach products, pointing each one back at `customer`.
    pub fn set_products(customer: &Rc<RefCell<Customer>>, products: Vec<Rc<RefCell<Product>>>) {
        for product in &products {
            product.borrow_mut().customer = Rc::downgrade(customer);
        }
        customer.borrow_mut().products = products;
    }

    /// Attach a contact, pointing it back at `customer`.
    pub fn set_contact(customer: &Rc<RefCell<Customer>>, contact: Rc<RefCell<Contact>>) {
        contact.borrow_mut().customer = Rc::downgrade(customer);
        customer.borrow_mut().contact = Some(contact);
    }
}

impl RowFields for Customer {
    fn type_name(&self) -> &'static str {
        "Customer"
    }

    fn field_value(&self, field: &str) -> Result<Value> {
        match field {
            "id" => Ok(self.id.into()),
            "last_seen_on" => Ok(date(self.last_seen_on)),
            other => Err(Error::unknown_field("Customer", other)),
        }
    }
}

impl Entity for Customer {
    fn schema(&self) -> &'static EntitySchema {
        &CUSTOMER
    }

    fn related(&self, relation: &str) -> Result<Related> {
        match relation {
            "products" => Ok(Related::Many(
                self.products
                    .iter()
                    .map(|p| Rc::clone(p) as EntityRef)
                    .collect(),
            )),
            "contact" => Ok(match &self.contact {
                Some(contact) => Related::One(Rc::clone(contact) as EntityRef),
                None => Related::None,
            }),
            other => Err(Error::unknown_relation("Customer", other)),
        }
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value.try_into()?,
            other => return Err(Error::unknown_field("Customer", other)),
        }
        Ok(())
    }
}

impl RowFields for Contact {
    fn type_name(&self) -> &'static str {
        "Contact"
    }

    fn field_value(&self, field: &str) -> Result<Value> {
        match field {
            "id" => Ok(self.id.into()),
            "first_name" => Ok(self.first_name.clone().into()),
            "last_name" => Ok(self.last_name.clone().into()),
            "phone" => Ok(self.phone.clone().into()),
            other => Err(Error::unknown_field("Contact", other)),
        }
    }
}

impl Entity for Contact {
    fn schema(&self) -> &'static EntitySchema {
        &CONTACT
    }

    fn related(&self, relation: &str) -> Result<Related> {
        match relation {
            "customer" => Ok(upgrade(&self.customer)),
            other => Err(Error::unknown_relation("Contact", other)),
        }
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value.try_into()?,
            other => return Err(Error::unknown_field("Contact", other)),
        }
        Ok(())
    }
}

impl RowFields for Product {
    fn type_name(&self) -> &'static str {
        "Product"
    }

    fn field_value(&self, field: &str) -> Result<Value> {
        match field {
            "id" => Ok(self.id.into()),
            "title" => Ok(self.title.clone().into()),
            "description" => Ok(self.description.clone().into()),
            "price" => Ok(self.price.clone().map_or(Value::Null, Value::Decimal)),
            "purchased_on" => Ok(date(self.purchased_on)),
            other => Err(Error::unknown_field("Product", other)),
        }
    }
}

impl Entity for Product {
    fn schema(&self) -> &'static EntitySchema {
        &PRODUCT
    }

    fn related(&self, relation: &str) -> Result<Related> {
        match relation {
            "customer" => Ok(upgrade(&self.customer)),
            other => Err(Error::unknown_relation("Product", other)),
        }
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value.try_into()?,
            other => return Err(Error::unknown_field("Product", other)),
        }
        Ok(())
    }
}

pub fn new_contact() -> Rc<RefCell<Contact>> {
    Rc::new(RefCell::new(Contact {
        first_name: Some(FIRST_NAME.to_string()),
        last_name: Some(LAST_NAME.to_string()),
        phone: Some(PHONE.to_string()),
        ..Contact::default()
    }))
}

pub fn new_product() -> Rc<RefCell<Product>> {
    Rc::new(RefCell::new(Product {
        title: Some(PRODUCT_TITLE.to_string()),
        description: Some(PRODUCT_DESCRIPTION.to_string()),
        price: Some(PRODUCT_PRICE.to_string()),
        purchased_on: Some(sample_day()),
        ..Product::default()
    }))
}

/// A customer with a contact and four products.
pub fn new_customer() -> Rc<RefCell<Customer>> {
    let customer = Rc::new(RefCell::new(Customer {
        last_seen_on: Some(sample_day()),
        ..Customer::default()
    }));
    Customer::set_contact(&customer, new_contact());
    Customer::set_products(&customer, (0..4).map(|_| new_product()).collect());
    customer
}

/// View a typed handle as a graph reference.
pub fn as_entity<T: Entity + 'static>(entity: &Rc<RefCell<T>>) -> EntityRef {
    Rc::clone(entity) as EntityRef
}
