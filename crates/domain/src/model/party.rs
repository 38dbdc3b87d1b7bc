use common::EntityId;
use entity_store::Entity;
use serde::{Deserialize, Serialize};

use super::{MAX_CODE_LEN, MAX_TEXT_LEN};
use crate::validation::{Checker, Validate, Violation, ViolationReason};

/// Postal address of a client or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.postal_code, &self.country]
            .iter()
            .all(|part| part.trim().is_empty())
    }
}

/// A customer placing client orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: Option<EntityId>,
    pub code: String,
    pub name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// A supplier receiving supplier orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Option<EntityId>,
    pub code: String,
    pub name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    /// URL returned by the photo store.
    pub photo: Option<String>,
}

macro_rules! party_builders {
    ($ty:ident { $($extra:ident: $value:expr),* }) => {
        impl $ty {
            pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
                Self {
                    id: None,
                    code: code.into(),
                    name: name.into(),
                    first_name: None,
                    email: None,
                    phone: None,
                    address: None,
                    $($extra: $value),*
                }
            }

            pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
                self.first_name = Some(first_name.into());
                self
            }

            pub fn with_email(mut self, email: impl Into<String>) -> Self {
                self.email = Some(email.into());
                self
            }

            pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
                self.phone = Some(phone.into());
                self
            }

            pub fn with_address(mut self, address: Address) -> Self {
                self.address = Some(address);
                self
            }

            fn has_contact(&self) -> bool {
                let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
                filled(&self.email)
                    || filled(&self.phone)
                    || self.address.as_ref().is_some_and(|a| !a.is_blank())
            }
        }

        impl Entity for $ty {
            const KIND: &'static str = stringify!($ty);

            fn id(&self) -> Option<EntityId> {
                self.id
            }

            fn set_id(&mut self, id: EntityId) {
                self.id = Some(id);
            }

            fn code(&self) -> Option<&str> {
                Some(&self.code)
            }
        }

        impl Validate for $ty {
            fn validate(&self) -> Vec<Violation> {
                let mut checker = Checker::new();
                checker
                    .text("code", &self.code, MAX_CODE_LEN)
                    .text("name", &self.name, MAX_TEXT_LEN);
                if !self.has_contact() {
                    checker.push(
                        ViolationReason::MissingContact,
                        "contact",
                        "at least one of email, phone or address is required".to_string(),
                    );
                }
                checker.finish()
            }
        }
    };
}

party_builders!(Client {});
party_builders!(Supplier { photo: None });
