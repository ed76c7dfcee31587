//! Site-wide settings singleton.
//!
//! Settings are grouped into seven sections. Every field has a bundled
//! default and every struct is `#[serde(default)]`, so decoding a partial
//! document merges it field-by-field over the defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when editing a single settings field.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Section name does not exist.
    #[error("unknown settings section: {0}")]
    UnknownSection(String),

    /// Field name does not exist in the section.
    #[error("unknown field {field} in settings section {section}")]
    UnknownField { section: String, field: String },

    /// Value has the wrong shape for the field.
    #[error("invalid value for {section}.{field}: {source}")]
    InvalidValue {
        section: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// Settings could not be converted to JSON.
    #[error("settings serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Names of the settings sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsSection {
    General,
    Appearance,
    Email,
    Payments,
    Notifications,
    Contact,
    About,
}

impl SettingsSection {
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::Appearance,
        Self::Email,
        Self::Payments,
        Self::Notifications,
        Self::Contact,
        Self::About,
    ];

    /// JSON key of the section.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Appearance => "appearance",
            Self::Email => "email",
            Self::Payments => "payments",
            Self::Notifications => "notifications",
            Self::Contact => "contact",
            Self::About => "about",
        }
    }
}

impl std::fmt::Display for SettingsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for SettingsSection {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.key() == s)
            .ok_or_else(|| SettingsError::UnknownSection(s.to_owned()))
    }
}

/// The full settings object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub general: GeneralSettings,
    pub appearance: AppearanceSettings,
    pub email: EmailSettings,
    pub payments: PaymentSettings,
    pub notifications: NotificationSettings,
    pub contact: ContactSettings,
    pub about: AboutSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralSettings {
    pub site_name: String,
    pub site_description: String,
    pub logo: String,
    pub favicon: String,
    pub currency: String,
    pub language: String,
    pub timezone: String,
    pub maintenance_mode: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            site_name: "Template Shop".to_string(),
            site_description: "Website templates and digital products".to_string(),
            logo: "/images/logo.png".to_string(),
            favicon: "/favicon.ico".to_string(),
            currency: "VND".to_string(),
            language: "vi".to_string(),
            timezone: "Asia/Ho_Chi_Minh".to_string(),
            maintenance_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppearanceSettings {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub dark_mode: bool,
    pub show_banner: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: "#f59e0b".to_string(),
            font_family: "Inter".to_string(),
            dark_mode: false,
            show_banner: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@templateshop.vn".to_string(),
            from_name: "Template Shop".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentSettings {
    pub cod_enabled: bool,
    pub bank_transfer_enabled: bool,
    pub momo_enabled: bool,
    pub vnpay_enabled: bool,
    pub bank_name: String,
    pub bank_account: String,
    pub bank_holder: String,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Decimal,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            cod_enabled: true,
            bank_transfer_enabled: true,
            momo_enabled: false,
            vnpay_enabled: false,
            bank_name: "Vietcombank".to_string(),
            bank_account: String::new(),
            bank_holder: String::new(),
            shipping_fee: Decimal::from(30_000),
            free_shipping_threshold: Decimal::from(500_000),
        }
    }
}

impl PaymentSettings {
    /// Shipping fee for a cart subtotal: free at or above the threshold.
    #[must_use]
    pub fn shipping_fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    pub order_email: bool,
    pub new_user_email: bool,
    pub low_stock_alert: bool,
    pub newsletter: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            order_email: true,
            new_user_email: true,
            low_stock_alert: false,
            newsletter: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSettings {
    pub email: String,
    pub phone: String,
    pub hotline: String,
    pub address: String,
    pub working_hours: String,
    pub facebook: String,
    pub zalo: String,
    pub youtube: String,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            email: "support@templateshop.vn".to_string(),
            phone: "0901 234 567".to_string(),
            hotline: "1900 1234".to_string(),
            address: "Ho Chi Minh City, Vietnam".to_string(),
            working_hours: "08:00 - 22:00".to_string(),
            facebook: String::new(),
            zalo: String::new(),
            youtube: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutSettings {
    pub title: String,
    pub description: String,
    pub mission: String,
    pub vision: String,
    pub founded_year: u16,
    pub team_size: u32,
}

impl Default for AboutSettings {
    fn default() -> Self {
        Self {
            title: "About Template Shop".to_string(),
            description: "We build ready-to-launch website templates.".to_string(),
            mission: "Help small businesses get online quickly.".to_string(),
            vision: "The go-to marketplace for Vietnamese web templates.".to_string(),
            founded_year: 2020,
            team_size: 12,
        }
    }
}

impl SiteSettings {
    /// Replace one leaf field, addressed by section and camelCase field name.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the section or field does not exist or the
    /// value does not fit the field's type. On error `self` is unchanged.
    pub fn set_field(
        &mut self,
        section: SettingsSection,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), SettingsError> {
        let mut doc = serde_json::to_value(&*self)?;

        let slot = doc
            .get_mut(section.key())
            .and_then(serde_json::Value::as_object_mut)
            .ok_or_else(|| SettingsError::UnknownSection(section.key().to_owned()))?
            .get_mut(field)
            .ok_or_else(|| SettingsError::UnknownField {
                section: section.key().to_owned(),
                field: field.to_owned(),
            })?;
        *slot = value;

        *self = serde_json::from_value(doc).map_err(|source| SettingsError::InvalidValue {
            section: section.key().to_owned(),
            field: field.to_owned(),
            source,
        })?;
        Ok(())
    }

    /// One section as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Serialize` if conversion fails.
    pub fn section_value(
        &self,
        section: SettingsSection,
    ) -> Result<serde_json::Value, SettingsError> {
        let doc = serde_json::to_value(self)?;
        Ok(doc
            .get(section.key())
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }
}
