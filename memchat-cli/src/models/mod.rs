pub mod error;
pub mod openai;

#[cfg(test)]
mod tests;
