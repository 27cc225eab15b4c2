fn main() {
    // ESP-IDF link metadata is only meaningful for device builds; host
    // builds (library + test suite) must not require the espidf sysenv.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
