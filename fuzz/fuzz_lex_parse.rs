//! AFL fuzz target exercising the lexer, macro expander, and parser on
//! arbitrary byte input. Evaluation is deliberately out of scope here —
//! this target is about crashing/hanging the front end, not about
//! meaningful runtime behavior.

extern crate afl;

fn main() {
    afl::fuzz!(|data: &[u8]| {
        if let Ok(source) = std::str::from_utf8(data) {
            let _ = wenyan::compile(source);
        }
    });
}
