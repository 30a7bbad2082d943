//! Forwards badge settings from `.env` to the firmware build.
//!
//! Recognised keys: `BADGE_RADIO_GROUP`, `BADGE_UPPER_LIMIT`,
//! `BADGE_LOWER_LIMIT`. Missing keys keep the firmware defaults.

const KEYS: [&str; 3] = ["BADGE_RADIO_GROUP", "BADGE_UPPER_LIMIT", "BADGE_LOWER_LIMIT"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    // A missing .env is fine, the process environment still applies
    let _ = dotenvy::dotenv();

    for key in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
