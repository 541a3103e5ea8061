use crate::stack::{ExecStack, StackValue};
use atomc_util::RuntimeError;
use rustc_hash::FxHashMap;

/// Signature every external function is registered under: it consumes its
/// arguments (and may push a result) by mutating the shared execution
/// stack directly, the same way the VM's own opcodes do.
pub type ExternalFn = Box<dyn Fn(&mut ExecStack) -> Result<(), RuntimeError>>;

/// `name -> implementation` table consulted by `CALL_EXT`. The only public
/// extension point of the VM.
#[derive(Default)]
pub struct ExternalRegistry {
    functions: FxHashMap<String, ExternalFn>,
}

impl ExternalRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register("put_i", Box::new(external_put_i));
        registry.register("put_d", Box::new(external_put_d));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, f: ExternalFn) {
        self.functions.insert(name.into(), f);
    }

    pub fn call(&self, name: &str, stack: &mut ExecStack) -> Result<(), RuntimeError> {
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownExternal { name: name.to_owned() })?;
        f(stack)
    }
}

fn external_put_i(stack: &mut ExecStack) -> Result<(), RuntimeError> {
    let v = stack.pop()?.as_int()?;
    println!("=> {v}");
    Ok(())
}

/// Distinct from `external_put_i`: bound to its own name in the registry
/// and formats the float so whole values still read as `0.0`/`1.0` rather
/// than Rust's default `0`/`1`.
fn external_put_d(stack: &mut ExecStack) -> Result<(), RuntimeError> {
    let v = stack.pop()?.as_float()?;
    println!("=> {}", format_double(v));
    Ok(())
}

fn format_double(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_i_and_put_d_are_distinct_registrations() {
        let registry = ExternalRegistry::new();
        let mut stack = ExecStack::new();
        stack.push(StackValue::Int(5));
        assert!(registry.call("put_i", &mut stack).is_ok());

        stack.push(StackValue::Float(2.0));
        assert!(registry.call("put_d", &mut stack).is_ok());
    }

    #[test]
    fn unknown_external_errors() {
        let registry = ExternalRegistry::new();
        let mut stack = ExecStack::new();
        assert!(matches!(
            registry.call("nope", &mut stack),
            Err(RuntimeError::UnknownExternal { .. })
        ));
    }

    #[test]
    fn format_double_keeps_a_decimal_point() {
        assert_eq!(format_double(0.0), "0.0");
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(0.5), "0.5");
    }
}
