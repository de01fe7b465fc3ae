fn main() {
    dosecalc_lib::run()
}
