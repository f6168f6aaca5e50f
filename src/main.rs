fn main() -> Result<(), Box<dyn std::error::Error>> {
    threadline::cli::main()
}
