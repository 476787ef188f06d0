#![cfg(target_arch = "wasm32")]

use crate::algorithms::flocking::FlockParams;
use crate::algorithms::scheduler::ExecutionMode;
use crate::config::SimConfig;
use crate::engine::{Engine, FrameReport, ScenarioInfo, SCENARIO_CALM, scenario_catalog};
use crate::models::population::Species;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn available_scenarios() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in scenario_catalog() {
        out.push(&scenario_info_to_js(info));
    }
    out
}

#[wasm_bindgen]
pub fn flock_defaults() -> JsValue {
    let params = FlockParams::default();
    serde_wasm_bindgen::to_value(&params).unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub fn config_defaults() -> JsValue {
    serde_wasm_bindgen::to_value(&SimConfig::default()).unwrap_or(JsValue::NULL)
}

fn set_field(obj: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(obj, &JsValue::from_str(key), value);
}

fn scenario_info_to_js(info: &ScenarioInfo) -> JsValue {
    let obj = js_sys::Object::new();
    set_field(&obj, "id", &JsValue::from_str(info.id));
    set_field(&obj, "name", &JsValue::from_str(info.name));
    set_field(&obj, "description", &JsValue::from_str(info.description));
    set_field(&obj, "boids", &JsValue::from_f64(info.boids as f64));
    set_field(&obj, "predators", &JsValue::from_f64(info.predators as f64));
    JsValue::from(obj)
}

fn report_to_js(report: &FrameReport) -> JsValue {
    let obj = js_sys::Object::new();
    set_field(&obj, "frame", &JsValue::from_f64(report.frame as f64));
    set_field(&obj, "killed", &JsValue::from_f64(report.killed.len() as f64));
    set_field(&obj, "boids", &JsValue::from_f64(report.boids as f64));
    set_field(&obj, "predators", &JsValue::from_f64(report.predators as f64));
    JsValue::from(obj)
}

fn to_js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WasmFlock {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmFlock {
    #[wasm_bindgen(constructor)]
    pub fn new(scenario_id: &str) -> Result<WasmFlock, JsValue> {
        let mut engine = Engine::new_builtin(scenario_id).map_err(to_js_err)?;
        // rayon has no thread pool in a plain wasm module
        engine.set_execution_mode(ExecutionMode::Sequential);
        Ok(WasmFlock { engine })
    }

    pub fn new_demo() -> Result<WasmFlock, JsValue> {
        WasmFlock::new(SCENARIO_CALM)
    }

    /// Build from a config object shaped like `SimConfig`:
    /// {
    ///   params?: { domain_radius?, cohesion_radius?, ..., max_neighbors? },
    ///   population?: { boids?, predators?, seed? },
    ///   scheduler?: { chunk_size?, mode?: "sequential" | "parallel" },
    ///   motion?: { smooth_time? }
    /// }
    #[wasm_bindgen(js_name = "newFromConfig")]
    pub fn new_from_config(config: JsValue) -> Result<WasmFlock, JsValue> {
        let mut cfg: SimConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        cfg.scheduler.mode = ExecutionMode::Sequential;
        let engine = Engine::from_config(&cfg).map_err(to_js_err)?;
        Ok(WasmFlock { engine })
    }

    pub fn len(&self) -> usize { self.engine.len() }

    pub fn boid_count(&self) -> usize { self.engine.boid_count() }

    pub fn predator_count(&self) -> usize { self.engine.predator_count() }

    pub fn frame(&self) -> f64 { self.engine.frame() as f64 }

    /// Advance one frame and return `{ frame, killed, boids, predators }`.
    pub fn tick(&mut self, dt: f64) -> Result<JsValue, JsValue> {
        let report = self.engine.tick(dt).map_err(to_js_err)?;
        Ok(report_to_js(&report))
    }

    pub fn add_predator(&mut self) -> usize {
        self.engine.add_predator();
        self.engine.predator_count()
    }

    pub fn remove_predator(&mut self) -> bool {
        self.engine.remove_predator().is_some()
    }

    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let params: FlockParams = serde_wasm_bindgen::from_value(params)
            .map_err(|e| JsValue::from_str(&format!("invalid flock params: {}", e)))?;
        self.engine.set_params(params).map_err(to_js_err)
    }

    pub fn params(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.engine.params()).unwrap_or(JsValue::NULL)
    }

    pub fn set_smooth_time(&mut self, smooth_time: f64) -> Result<(), JsValue> {
        self.engine.set_smooth_time(smooth_time).map_err(to_js_err)
    }

    pub fn positions(&self) -> Vec<f32> { self.engine.positions_flat(Species::Ordinary) }

    pub fn headings(&self) -> Vec<f32> { self.engine.headings_flat(Species::Ordinary) }

    pub fn predator_positions(&self) -> Vec<f32> { self.engine.positions_flat(Species::Predator) }

    pub fn predator_headings(&self) -> Vec<f32> { self.engine.headings_flat(Species::Predator) }
}
