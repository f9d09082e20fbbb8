fn main() {
    // Only the ESP-IDF firmware build needs the IDF environment; host
    // builds (tests, fuzzing) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
