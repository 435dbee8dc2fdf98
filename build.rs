use time::macros::format_description;
use time::OffsetDateTime;

fn main() {
    let now = OffsetDateTime::now_utc();
    let date = now.format(format_description!("[year]-[month]-[day]")).ok();
    let time = now.format(format_description!("[hour]:[minute]")).ok();

    stamp("PKGEXPORT_BUILD_DATE", date);
    stamp("PKGEXPORT_BUILD_TIME", time);
}

/// Pass `var` to rustc; an override in the build environment wins.
fn stamp(var: &str, computed: Option<String>) {
    println!("cargo:rerun-if-env-changed={var}");
    let value = std::env::var(var)
        .ok()
        .or(computed)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={var}={value}");
}
