//! Fixed redemption email template

use vendo_types::CredentialKey;

/// Subject line for every redemption email.
pub const SUBJECT: &str = "Your One-Time Download Link";

/// Build the redemption link and render the email body.
///
/// The link is the external base URL joined to `/download/<key>` with
/// exactly one separator regardless of how the configured base is
/// written. The body states plainly that the link works only once.
#[must_use]
pub fn redemption_email(download_base_url: &str, key: &CredentialKey) -> (String, String) {
    let link = format!(
        "{}/download/{}",
        download_base_url.trim_end_matches('/'),
        key
    );
    let body = format!(
        "Hi there,\n\
         \n\
         Thanks for your purchase. Here's your download link:\n\
         {link}\n\
         \n\
         This link works only once. Please download and save your files immediately.\n\
         Once used, the link will expire.\n\
         \n\
         - Entropy Store\n"
    );
    (SUBJECT.to_string(), body)
}
