//! Call-boundary checks without reflection.
//!
//! A `Signature` lists a function's parameter templates and, optionally, its
//! return template. Callers check arguments before running the body and the
//! result afterwards; paths are labelled `name(param)` and `name()->`.
use crate::error::{ErrorKind, ValidationError};
use crate::matcher::Validator;
use crate::path::Path;
use crate::template::Template;
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct Signature {
    name: String,
    params: Vec<(String, Template)>,
    returns: Option<Template>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: Vec::new(), returns: None }
    }

    pub fn param(mut self, name: impl Into<String>, template: impl Into<Template>) -> Self {
        self.params.push((name.into(), template.into()));
        self
    }

    pub fn returns(mut self, template: impl Into<Template>) -> Self {
        self.returns = Some(template.into());
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn check_args(&self, validator: &Validator, args: &[Value]) -> Result<(), ValidationError> {
        if !validator.config().enabled {
            return Ok(());
        }
        if args.len() != self.params.len() {
            let label = format!("{}()", self.name);
            return Err(ValidationError::new(
                ErrorKind::LengthMismatch,
                &Path::named(&label),
                format!("takes {} arguments but got {}", self.params.len(), args.len()),
            ));
        }
        for ((param, template), arg) in self.params.iter().zip(args) {
            validator.validate_at(arg, template, &format!("{}({param})", self.name))?;
        }
        Ok(())
    }

    pub fn check_return(&self, validator: &Validator, value: &Value) -> Result<(), ValidationError> {
        match &self.returns {
            Some(template) => validator.validate_at(value, template, &format!("{}()->", self.name)),
            None => Ok(()),
        }
    }

    /// Check `args`, run `body`, check its result.
    pub fn call<F>(&self, validator: &Validator, args: &[Value], body: F) -> Result<Value, ValidationError>
    where
        F: FnOnce(&[Value]) -> Value,
    {
        self.check_args(validator, args)?;
        let out = body(args);
        self.check_return(validator, &out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::value::Kind;

    fn add(args: &[Value]) -> Value {
        match args {
            [Value::Int(a), Value::Int(b)] => Value::Int(a + b),
            [Value::Int(a), Value::Float(b)] => Value::Float(*a as f64 + b),
            _ => Value::Null,
        }
    }

    #[test]
    fn arguments_are_checked_in_order_with_labelled_paths() {
        let sig = Signature::new("sum1").param("a", Kind::Int).param("b", Kind::Int).returns(Kind::Int);
        let validator = Validator::default();
        assert_eq!(sig.call(&validator, &[Value::Int(2), Value::Int(2)], add), Ok(Value::Int(4)));
        let err = sig.call(&validator, &[Value::Int(2), Value::Float(2.0)], add).unwrap_err();
        assert_eq!(err.to_string(), "sum1(b): is float but should be int");
    }

    #[test]
    fn return_values_are_checked() {
        let sig = Signature::new("id1").param("x", Kind::Int).returns(Kind::Int);
        let err = sig.call(&Validator::default(), &[Value::Int(2)], |_| Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "id1()->: is null but should be int");
    }

    #[test]
    fn return_template_may_be_wider_than_params() {
        let sig = Signature::new("sum2").param("a", Kind::Int).param("b", Kind::Float).returns(Kind::Number);
        let validator = Validator::default();
        assert!(sig.call(&validator, &[Value::Int(1), Value::Float(0.5)], add).is_ok());
        let err = sig.check_args(&validator, &[Value::Int(2), Value::Int(2)]).unwrap_err();
        assert_eq!(err.path(), "sum2(b)");
    }

    #[test]
    fn arity_mismatch_and_disabled_config() {
        let sig = Signature::new("f").param("x", Kind::Int);
        let err = sig.check_args(&Validator::default(), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
        assert!(sig.check_args(&Validator::new(Config::disabled()), &[]).is_ok());
    }
}
