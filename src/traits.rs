use crate::types::Result;

pub trait OptProcess {
    fn process(&self) -> Result<()>;
}
