//! Purchase orders: an order references an existing customer and owns its lines.

use super::sample::{CUSTOMER, Customer};
use infile::prelude::*;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

fn customer_schema() -> &'static EntitySchema {
    &CUSTOMER
}

fn order_schema() -> &'static EntitySchema {
    &ORDER
}

fn line_schema() -> &'static EntitySchema {
    &ORDER_LINE
}

pub static ORDER: EntitySchema = EntitySchema::new("PurchaseOrder")
    .table("purchase_order")
    .identity(IdentityInfo::auto("id"))
    .columns(&[ColumnInfo::new("reference"), ColumnInfo::new("paid")])
    .relationships(&[
        RelationshipInfo::many_to_one("customer", customer_schema).join_column("customer_id"),
        RelationshipInfo::one_to_many("lines", line_schema).mapped_by("order_id"),
    ]);

pub static ORDER_LINE: EntitySchema = EntitySchema::new("OrderLine")
    .table("order_line")
    .identity(IdentityInfo::auto("id"))
    .columns(&[
        ColumnInfo::new("order_id"),
        ColumnInfo::new("sku"),
        ColumnInfo::new("quantity"),
    ])
    .relationships(&[RelationshipInfo::many_to_one("order", order_schema)]);

#[derive(Default)]
pub struct PurchaseOrder {
    pub id: Option<i64>,
    pub reference: String,
    pub paid: bool,
    pub customer: Option<Rc<RefCell<Customer>>>,
    pub lines: Vec<Rc<RefCell<OrderLine>>>,
}

/// A line copies its order's key into `order_id` rather than reading it
/// through a join column.
#[derive(Default)]
pub struct OrderLine {
    pub id: Option<i64>,
    pub order_id: Option<i64>,
    pub sku: String,
    pub quantity: i32,
    pub order: Weak<RefCell<PurchaseOrder>>,
}

impl RowFields for PurchaseOrder {
    fn type_name(&self) -> &'static str {
        "PurchaseOrder"
    }

    fn field_value(&self, field: &str) -> Result<Value> {
        match field {
            "id" => Ok(self.id.into()),
            "reference" => Ok(self.reference.as_str().into()),
            "paid" => Ok(self.paid.into()),
            other => Err(Error::unknown_field("PurchaseOrder", other)),
        }
    }
}

impl Entity for PurchaseOrder {
    fn schema(&self) -> &'static EntitySchema {
        &ORDER
    }

    fn related(&self, relation: &str) -> Result<Related> {
        match relation {
            "customer" => Ok(match &self.customer {
                Some(customer) => Related::One(Rc::clone(customer) as EntityRef),
                None => Related::None,
            }),
            "lines" => Ok(Related::Many(
                self.lines
                    .iter()
                    .map(|l| Rc::clone(l) as EntityRef)
                    .collect(),
            )),
            other => Err(Error::unknown_relation("PurchaseOrder", other)),
        }
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value.try_into()?,
            other => return Err(Error::unknown_field("PurchaseOrder", other)),
        }
        Ok(())
    }
}

impl RowFields for OrderLine {
    fn type_name(&self) -> &'static str {
        "OrderLine"
    }

    fn field_value(&self, field: &str) -> Result<Value> {
        match field {
            "id" => Ok(self.id.into()),
            "order_id" => Ok(self.order_id.into()),
            "sku" => Ok(self.sku.as_str().into()),
            "quantity" => Ok(self.quantity.into()),
            other => Err(Error::unknown_field("OrderLine", other)),
        }
    }
}

impl Entity for OrderLine {
    fn schema(&self) -> &'static EntitySchema {
        &ORDER_LINE
    }

    fn related(&self, relation: &str) -> Result<Related> {
        match relation {
            "order" => Ok(match self.order.upgrade() {
                Some(order) => Related::One(order as EntityRef),
                None => Related::None,
            }),
            other => Err(Error::unknown_relation("OrderLine", other)),
        }
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value.try_into()?,
            "order_id" => self.order_id = value.try_into()?,
            other => return Err(Error::unknown_field("OrderLine", other)),
        }
        Ok(())
    }
}

/// An unpaid order for `customer` with three lines.
pub fn new_order(customer: &Rc<RefCell<Customer>>) -> Rc<RefCell<PurchaseOrder>> {
    let order = Rc::new(RefCell::new(PurchaseOrder {
        reference: "PO-7".to_string(),
        customer: Some(Rc::clone(customer)),
        ..PurchaseOrder::default()
    }));
    let lines = ["A-1", "B-2", "C-3"]
        .into_iter()
        .enumerate()
        .map(|(i, sku)| {
            Rc::new(RefCell::new(OrderLine {
                sku: sku.to_string(),
                quantity: i as i32 + 1,
                order: Rc::downgrade(&order),
                ..OrderLine::default()
            }))
        })
        .collect();
    order.borrow_mut().lines = lines;
    order
}
