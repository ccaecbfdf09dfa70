fn main() {
    uniffi::generate_scaffolding("src/roomkit.udl").unwrap();
}
