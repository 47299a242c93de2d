use encuesta_domain::Rol;
use flow::errors::FlowError;
use flow::stubs::InMemoryEncuestaApi;
use flow::{EncuestaApi, FlowEngine, PrecondicionesCompletar};
use std::sync::Arc;

fn main() -> Result<(), FlowError> {
    // Servidor en memoria con las encuestas de ejemplo
    let api = Arc::new(InMemoryEncuestaApi::con_datos_de_ejemplo()?);
    let engine = FlowEngine::new(api.clone());

    let encuesta = api.obtener_encuesta(1)?;
    println!("encuesta {} en '{}'", encuesta.encuesta_id, encuesta.estado_id);

    // El encuestador completa: sin secciones pendientes ni cambios
    let pre = PrecondicionesCompletar { tipo_encuesta: encuesta.tipo_encuesta,
                                        secciones_incompletas: Vec::new(),
                                        cambios_sin_guardar: false };
    let encuesta = engine.completar(&encuesta, Rol::Encuestador, &pre)?;
    println!("-> {}", encuesta.estado_id);

    // El validador abre la revisión y deja una observación
    let encuesta = engine.abrir_revision(&encuesta, Rol::Validador)?;
    println!("-> {} (ciclo {})", encuesta.estado_id, api.ciclo_revision(1)?);
    api.guardar_observacion(1, "compra", "Revisar el precio declarado")?;
    let activas = api.listar_observaciones(1)?.iter().filter(|o| o.esta_activa()).count();
    let encuesta = engine.enviar_revision(&encuesta, Rol::Validador, activas)?;
    println!("-> {} con {} observación(es)", encuesta.estado_id, activas);

    // El encuestador toma conocimiento y corrige
    let encuesta = engine.confirmar_observaciones(&encuesta, Rol::Encuestador)?;
    println!("-> {}", encuesta.estado_id);

    // Una transición fuera de la tabla se rechaza sin llamar al servidor
    match engine.abrir_revision(&encuesta, Rol::Validador) {
        Ok(_) => println!("inesperado"),
        Err(e) => println!("rechazada localmente: {}", e),
    }

    println!("historial: {:?}", api.listar_historial(1)?);
    println!("llamadas: {:?}", api.llamadas());
    Ok(())
}
