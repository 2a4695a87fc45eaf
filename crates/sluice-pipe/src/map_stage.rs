//! Element mapping stages built from [`MapDef`]s.

use sluice_core::{
    Arg, CallArgs, Flow, FlowRef, MapDef, PipeError, Pull, Result, StageDef, Value,
};

/// Converts a map descriptor into a through stage.
///
/// Call arguments given to the stage follow the element: `name(x, y)` maps
/// `e` to `f(e, x, y)`. With `star_wrap` the element's items lead instead of
/// the element; with `double_star_wrap` a mapping element becomes keyword
/// arguments.
pub(crate) fn map_stage(def: MapDef) -> Result<StageDef> {
    if def.star_wrap && def.double_star_wrap {
        return Err(PipeError::Config(format!(
            "map stage '{}' sets both star_wrap and double_star_wrap",
            def.name
        )));
    }
    let name = def.name.clone();
    let no_over_write = def.no_over_write;
    let mut stage = StageDef::through(name, move |mut call: CallArgs| {
        let upstream = call.flow(0)?;
        call.positional.remove(0);
        Ok(FlowRef::new(MapFlow {
            upstream,
            def: def.clone(),
            extras: call,
        }))
    });
    stage.no_over_write = no_over_write;
    Ok(stage)
}

struct MapFlow {
    upstream: FlowRef,
    def: MapDef,
    extras: CallArgs,
}

impl MapFlow {
    fn apply(&self, element: Value) -> Result<Value> {
        let mut call = CallArgs::new();
        if self.def.star_wrap {
            call.positional
                .extend(element.into_items()?.into_iter().map(Arg::Value));
            call.positional.extend(self.extras.positional.iter().cloned());
        } else if self.def.double_star_wrap {
            call.positional = self.extras.positional.clone();
            let entries = match element {
                Value::Dict(entries) => entries,
                other => {
                    return Err(PipeError::Type(format!(
                        "{}() argument after ** must be a mapping, not {}",
                        self.def.name,
                        other.type_name()
                    )))
                }
            };
            for (k, v) in entries {
                let key = k.as_str().ok_or_else(|| {
                    PipeError::Type(format!("{}() keywords must be strings", self.def.name))
                })?;
                call.keywords.insert(key.to_string(), Arg::Value(v));
            }
        } else {
            call.positional.push(Arg::Value(element));
            call.positional.extend(self.extras.positional.iter().cloned());
        }
        for (k, v) in &self.extras.keywords {
            call.keywords.insert(k.clone(), v.clone());
        }
        (self.def.func)(&call)
    }
}

impl Flow for MapFlow {
    fn pull(&mut self) -> Result<Pull> {
        match self.upstream.pull()? {
            Pull::Item(v) => Ok(Pull::Item(self.apply(v)?)),
            other => Ok(other),
        }
    }
}
