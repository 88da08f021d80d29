use crate::catalog::{CatalogItem, CatalogItemId, NewCatalogItem};
use crate::error::ValidationError;
use crate::listing::{ListingDraft, ListingRequest};

/// Validator for client input.
pub struct Validator;

impl Validator {
    /// Require a present, non-blank string field.
    pub fn require_text(
        value: Option<String>,
        field: &'static str,
    ) -> Result<String, ValidationError> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ValidationError::MissingField(field)),
        }
    }

    /// Validate a price: finite and not negative.
    pub fn validate_price(price: f64) -> Result<(), ValidationError> {
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::InvalidPrice(price));
        }
        Ok(())
    }

    /// Validate username and password for signup or login.
    pub fn validate_credentials(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<(String, String), ValidationError> {
        let username = Self::require_text(username, "username")?;
        let password = Self::require_text(password, "password")?;
        Ok((username, password))
    }

    /// Validate a listing request into a draft.
    pub fn validate_listing(req: ListingRequest) -> Result<ListingDraft, ValidationError> {
        let catalog_item_id = req
            .catalog_item_id
            .ok_or(ValidationError::MissingField("catalogItemId"))?;
        let rarity = Self::require_text(req.rarity, "rarity")?;
        let price = req.price.ok_or(ValidationError::MissingField("price"))?;
        Self::validate_price(price)?;
        for m in &req.mods {
            if m.name.trim().is_empty() {
                return Err(ValidationError::MissingField("mods.name"));
            }
        }

        Ok(ListingDraft {
            catalog_item_id,
            rarity,
            price,
            mods: req.mods,
        })
    }

    /// Validate catalog input. Only presence of the required fields is checked.
    pub fn validate_catalog_item(input: NewCatalogItem) -> Result<CatalogItem, ValidationError> {
        Ok(CatalogItem {
            id: CatalogItemId::new(),
            name: Self::require_text(input.name, "name")?,
            item_type: Self::require_text(input.item_type, "type")?,
            icon: Self::require_text(input.icon, "icon")?,
            stats: input.stats,
        })
    }
}
