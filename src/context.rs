//! Object store context
//!
//! The Context is the main entry point for creating objects. It owns the
//! store configuration and the two intrinsic prototypes every object chain
//! ends in. With `lazy_prototypes` enabled (the default) the prototypes are
//! lazy objects and cost nothing until first touched.

use std::rc::Rc;

use tracing::debug;

use crate::config::{PromotionPolicy, StoreConfig};
use crate::error::{JsError, JsResult};
use crate::runtime::{
    ArrayObject, BaseObject, Hint, Object, Property, Representation, SlotValue,
    SparseArrayObject,
};
use crate::value::Value;

/// Object store context
pub struct Context {
    config: StoreConfig,
    object_prototype: Object,
    array_prototype: Object,
}

impl Context {
    /// Create a context with the default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a context with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        let object_prototype = intrinsic(config.lazy_prototypes, build_object_prototype);

        let parent = object_prototype.clone();
        let policy = config.promotion;
        let array_prototype = intrinsic(config.lazy_prototypes, move || {
            build_array_prototype(parent, policy)
        });

        debug!(?config, "created context");
        Context {
            config,
            object_prototype,
            array_prototype,
        }
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// `Object.prototype`
    #[inline]
    pub fn object_prototype(&self) -> &Object {
        &self.object_prototype
    }

    /// `Array.prototype`
    #[inline]
    pub fn array_prototype(&self) -> &Object {
        &self.array_prototype
    }

    /// Create an empty ordinary object
    pub fn new_object(&self) -> Object {
        Object::new(Representation::Base(BaseObject::new(
            "Object",
            Some(self.object_prototype.clone()),
        )))
    }

    /// Create an empty array that starts out sparse
    pub fn new_sparse_array(&self) -> Object {
        Object::new(Representation::Sparse(self.sparse_array()))
    }

    /// Create a sparse array from a list with holes
    ///
    /// # Arguments
    /// * `values` - Elements in index order; `None` leaves a hole
    pub fn new_array_from(&self, values: Vec<Option<Value>>) -> Object {
        let mut arr = self.sparse_array();
        arr.set_values(values);
        Object::new(Representation::Sparse(arr))
    }

    /// Create a dense array holding `values`
    pub fn new_array(&self, values: Vec<Value>) -> Object {
        Object::new(Representation::Dense(
            ArrayObject::from_values(Some(self.array_prototype.clone()), values)
                .with_policy(self.config.promotion),
        ))
    }

    /// Create a native function object
    pub fn new_function(
        &self,
        call: impl Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    ) -> Object {
        Object::new(Representation::Base(BaseObject::function(
            Rc::new(call),
            Some(self.object_prototype.clone()),
        )))
    }

    /// Create an object whose contents are built on first use
    ///
    /// The factory receives the object's own handle and runs at most once.
    pub fn new_lazy(&self, factory: impl FnOnce(&Object) -> Representation + 'static) -> Object {
        Object::lazy(factory)
    }

    fn sparse_array(&self) -> SparseArrayObject {
        SparseArrayObject::new(Some(self.array_prototype.clone()), self.config.promotion)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn intrinsic(lazy: bool, build: impl FnOnce() -> Representation + 'static) -> Object {
    if lazy {
        Object::lazy(move |_| build())
    } else {
        Object::new(build())
    }
}

fn method(
    props: &mut BaseObject,
    name: &str,
    f: impl Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
) {
    let function = Object::function(f);
    props.put_raw(
        name,
        SlotValue::Property(Property::data(Value::Object(function), true, false, true)),
    );
}

fn this_object<'a>(this: &'a Value, what: &str) -> JsResult<&'a Object> {
    this.as_object()
        .ok_or_else(|| JsError::TypeError(format!("{} called on non-object", what)))
}

fn build_object_prototype() -> Representation {
    let mut proto = BaseObject::new("Object", None);
    method(&mut proto, "toString", |this, _| {
        let tag = match this {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Object(o) => o.class_name()?,
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
        };
        Ok(Value::string(&format!("[object {}]", tag)))
    });
    method(&mut proto, "valueOf", |this, _| Ok(this.clone()));
    method(&mut proto, "hasOwnProperty", |this, args| {
        let key = args.first().cloned().unwrap_or_default();
        Ok(Value::Bool(this_object(this, "hasOwnProperty")?.has_own_property(&key)?))
    });
    Representation::Base(proto)
}

fn build_array_prototype(parent: Object, policy: PromotionPolicy) -> Representation {
    let mut proto = SparseArrayObject::new(Some(parent), policy);
    let props = &mut proto.base;
    method(props, "join", |this, args| {
        let sep = match args.first() {
            None | Some(Value::Undefined) => ",".to_string(),
            Some(v) => v.to_string(),
        };
        join(this_object(this, "Array.prototype.join")?, &sep)
    });
    method(props, "toString", |this, _| {
        join(this_object(this, "Array.prototype.toString")?, ",")
    });
    method(props, "push", |this, args| {
        let arr = this_object(this, "Array.prototype.push")?;
        let mut len = f64::from(array_length(arr)?);
        for value in args {
            arr.put(&Value::Number(len), value.clone(), true)?;
            len += 1.0;
        }
        arr.put_str("length", Value::Number(len), true)?;
        Ok(Value::Number(len))
    });
    Representation::Sparse(proto)
}

fn array_length(arr: &Object) -> JsResult<u32> {
    let len = arr.get_str("length")?.to_number();
    Ok(if len.is_finite() && len > 0.0 {
        len.min(f64::from(u32::MAX)) as u32
    } else {
        0
    })
}

fn join(arr: &Object, sep: &str) -> JsResult<Value> {
    let len = array_length(arr)?;
    let mut out = String::new();
    for i in 0..len {
        if i > 0 {
            out.push_str(sep);
        }
        match arr.get(&Value::Number(f64::from(i)))? {
            Value::Undefined | Value::Null => {}
            Value::Object(o) => out.push_str(&o.to_primitive(Hint::String)?.to_string()),
            v => out.push_str(&v.to_string()),
        }
    }
    Ok(Value::string(&out))
}
