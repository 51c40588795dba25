//! Stamps the build date into `FOAM_AVERAGE_BUILD_DATE` for `--version`.
//! Honors `SOURCE_DATE_EPOCH` so reproducible builds get a fixed date.

use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let built = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);

    println!("cargo:rustc-env=FOAM_AVERAGE_BUILD_DATE={}", built.date());
}
