use super::super::domain::BusinessProfile;

/// The validatable form fields. `free_zone` is a plain checkbox and is
/// deliberately absent: it is never required and never invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    BusinessName,
    BusinessCategory,
    BusinessSubcategory,
    Country,
    Website,
    BusinessDescription,
    MonthlyVolume,
    OwnerName,
    ContactPhone,
    ContactAddress,
}

/// Fields gating the Business step.
pub const BUSINESS_STEP_FIELDS: [Field; 7] = [
    Field::BusinessName,
    Field::BusinessCategory,
    Field::BusinessSubcategory,
    Field::Country,
    Field::Website,
    Field::BusinessDescription,
    Field::MonthlyVolume,
];

/// Fields gating the Contact step.
pub const CONTACT_STEP_FIELDS: [Field; 3] = [
    Field::OwnerName,
    Field::ContactPhone,
    Field::ContactAddress,
];

impl Field {
    pub const fn key(self) -> &'static str {
        match self {
            Field::BusinessName => "business_name",
            Field::BusinessCategory => "business_category",
            Field::BusinessSubcategory => "business_subcategory",
            Field::Country => "country",
            Field::Website => "website",
            Field::BusinessDescription => "business_description",
            Field::MonthlyVolume => "monthly_volume",
            Field::OwnerName => "owner_name",
            Field::ContactPhone => "contact_phone",
            Field::ContactAddress => "contact_address",
        }
    }

    /// The inline error shown when the field is empty.
    pub const fn required_message(self) -> &'static str {
        match self {
            Field::BusinessName => "Company name is required",
            Field::BusinessCategory => "Business category is required",
            Field::BusinessSubcategory => "Business subcategory is required",
            Field::Country => "Country is required",
            Field::Website => "Website is required",
            Field::BusinessDescription => "Business description is required",
            Field::MonthlyVolume => "Monthly volume is required",
            Field::OwnerName => "Owner name is required",
            Field::ContactPhone => "Phone is required",
            Field::ContactAddress => "Address is required",
        }
    }

    /// The field's current value in the form.
    pub fn value(self, profile: &BusinessProfile) -> &str {
        match self {
            Field::BusinessName => &profile.business_name,
            Field::BusinessCategory => &profile.business_category,
            Field::BusinessSubcategory => &profile.business_subcategory,
            Field::Country => &profile.country,
            Field::Website => &profile.website,
            Field::BusinessDescription => &profile.business_description,
            Field::MonthlyVolume => &profile.monthly_volume,
            Field::OwnerName => &profile.owner_name,
            Field::ContactPhone => &profile.contact_phone,
            Field::ContactAddress => &profile.contact_address,
        }
    }
}
