pub mod ir;
pub mod run;
