fn main() {
    // Only the device build needs the ESP-IDF environment plumbing; host
    // test builds skip it.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
