use std::hint::black_box;

#[inline(never)]
fn fibonacci(v: u64) -> u64 {
    if v == 1 || v == 0 {
        return v;
    }
    fibonacci(v - 1) + fibonacci(v - 2)
}

fn main() {
    println!("{}", fibonacci(black_box(10)));
}
