fn main() {
    termsynth::cli::run();
}
