//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod client;
pub mod ledger;
pub mod product;
pub mod staff;
pub mod staff_payment;
pub mod staff_payment_template;
pub mod transaction;
pub mod transaction_item;
pub mod transaction_payment;
pub mod transaction_template;
pub mod user;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use ledger::{
    Column as LedgerColumn, Entity as Ledger, EntryType, Model as LedgerModel, ReferenceType,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel, ProductKind};
pub use staff::{Column as StaffColumn, Entity as Staff, Model as StaffModel};
pub use staff_payment::{
    Column as StaffPaymentColumn, Entity as StaffPayment, Model as StaffPaymentModel,
};
pub use staff_payment_template::{
    Column as StaffPaymentTemplateColumn, Entity as StaffPaymentTemplate,
    Model as StaffPaymentTemplateModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionStatus,
};
pub use transaction_item::{
    Column as TransactionItemColumn, Entity as TransactionItem, Model as TransactionItemModel,
};
pub use transaction_payment::{
    Column as TransactionPaymentColumn, Entity as TransactionPayment,
    Model as TransactionPaymentModel,
};
pub use transaction_template::{
    Column as TransactionTemplateColumn, Entity as TransactionTemplate,
    Model as TransactionTemplateModel, TemplateItem,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
