//! Profile block appended to the context when personalization is on.

use user_store::Profile;

/// English name of an ISO-3166 alpha-2 country code; the code itself if unknown.
pub fn country_label(code: &str) -> String {
    let name = match code.trim().to_ascii_uppercase().as_str() {
        "AR" => "Argentina",
        "AT" => "Austria",
        "AU" => "Australia",
        "BE" => "Belgium",
        "BG" => "Bulgaria",
        "BR" => "Brazil",
        "CA" => "Canada",
        "CH" => "Switzerland",
        "CL" => "Chile",
        "CN" => "China",
        "CO" => "Colombia",
        "CZ" => "Czechia",
        "DE" => "Germany",
        "DK" => "Denmark",
        "EE" => "Estonia",
        "EG" => "Egypt",
        "ES" => "Spain",
        "FI" => "Finland",
        "FR" => "France",
        "GB" => "United Kingdom",
        "GR" => "Greece",
        "HK" => "Hong Kong",
        "HR" => "Croatia",
        "HU" => "Hungary",
        "ID" => "Indonesia",
        "IE" => "Ireland",
        "IL" => "Israel",
        "IN" => "India",
        "IS" => "Iceland",
        "IT" => "Italy",
        "JP" => "Japan",
        "KE" => "Kenya",
        "KR" => "South Korea",
        "LT" => "Lithuania",
        "LU" => "Luxembourg",
        "LV" => "Latvia",
        "MA" => "Morocco",
        "MX" => "Mexico",
        "MY" => "Malaysia",
        "NG" => "Nigeria",
        "NL" => "Netherlands",
        "NO" => "Norway",
        "NZ" => "New Zealand",
        "PE" => "Peru",
        "PH" => "Philippines",
        "PK" => "Pakistan",
        "PL" => "Poland",
        "PT" => "Portugal",
        "RO" => "Romania",
        "RS" => "Serbia",
        "SA" => "Saudi Arabia",
        "SE" => "Sweden",
        "SG" => "Singapore",
        "SI" => "Slovenia",
        "SK" => "Slovakia",
        "TH" => "Thailand",
        "TR" => "Türkiye",
        "TW" => "Taiwan",
        "UA" => "Ukraine",
        "AE" => "United Arab Emirates",
        "US" => "United States",
        "VN" => "Vietnam",
        "ZA" => "South Africa",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// English name of an ISO-639-1 language code; the code itself if unknown.
pub fn language_label(code: &str) -> String {
    // Region suffixes such as `pt-BR` resolve by their language part.
    let base = code.trim().split(['-', '_']).next().unwrap_or_default();
    let name = match base.to_ascii_lowercase().as_str() {
        "ar" => "Arabic",
        "bg" => "Bulgarian",
        "bn" => "Bengali",
        "ca" => "Catalan",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "es" => "Spanish",
        "et" => "Estonian",
        "fa" => "Persian",
        "fi" => "Finnish",
        "fr" => "French",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hr" => "Croatian",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "is" => "Icelandic",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "lt" => "Lithuanian",
        "lv" => "Latvian",
        "ms" => "Malay",
        "nl" => "Dutch",
        "no" | "nb" => "Norwegian",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "sr" => "Serbian",
        "sv" => "Swedish",
        "sw" => "Swahili",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "ur" => "Urdu",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// Profile section, or `None` when the profile has nothing to add.
pub fn profile_block(profile: &Profile) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(v) = non_empty(&profile.name) {
        lines.push(format!("Name: {v}"));
    }
    if let Some(v) = non_empty(&profile.email) {
        lines.push(format!("Email: {v}"));
    }
    if let Some(v) = non_empty(&profile.contact) {
        lines.push(format!("Contact: {v}"));
    }
    if let Some(v) = non_empty(&profile.country) {
        lines.push(format!("Country: {}", country_label(v)));
    }
    if let Some(v) = non_empty(&profile.language) {
        lines.push(format!("Language: {}", language_label(v)));
    }
    if lines.is_empty() {
        return None;
    }
    Some(format!("User profile:\n{}", lines.join("\n")))
}

/// Appends the profile block to `context` when there is one.
pub fn personalize(context: String, profile: &Profile) -> String {
    match profile_block(profile) {
        Some(block) => format!("{context}\n\n{block}"),
        None => context,
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
