fn main() {
    // Emit the ESP-IDF sysenv only for flash builds; host builds (default
    // features) have no IDF toolchain to interrogate.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
