// Source text generation for tracing wrappers.
// The layout matches what gofmt produces, so formatting is a no-op for
// well-formed input.

use super::{FieldPlan, FilePlan, MethodPlan, WrapperPlan};

/// Renders the package clause, the import block and every wrapper.
pub fn render(file: &FilePlan) -> String {
    let mut result = format!("package {}\n\n", file.package_name);

    result.push_str("import (\n");
    for import in &file.imports {
        result.push_str(&format!("\t{}\n", import.to_spec()));
    }
    result.push_str(")\n");

    for wrapper in &file.wrappers {
        result.push('\n');
        result.push_str(&render_wrapper(file, wrapper));
    }
    result
}

fn render_wrapper(file: &FilePlan, wrapper: &WrapperPlan) -> String {
    let decl_params = wrapper
        .type_params
        .as_ref()
        .map(|params| format!("[{params}]"))
        .unwrap_or_default();
    let struct_type = wrapper.struct_type();

    let mut result = format!("// {} wraps OpenTelemetry's span\n", wrapper.struct_name);
    result.push_str(&format!("type {}{decl_params} struct {{\n", wrapper.struct_name));
    result.push_str(&format!("\t{}\n", wrapper.embedded));
    result.push_str(&format!("\ttracer {}\n", file.tracer_type));
    result.push_str("\tprefix string\n");
    result.push_str("}\n\n");

    result.push_str(&format!("// New{} creates a wrapper\n", wrapper.struct_name));
    result.push_str(&format!(
        "func New{}{decl_params}(wrapped {}, tracer {}, prefix string) *{struct_type} {{\n",
        wrapper.struct_name, wrapper.embedded, file.tracer_type
    ));
    result.push_str(&format!("\treturn &{struct_type}{{\n"));
    result.push_str(&format!("\t\t{}: wrapped,\n", wrapper.name));
    result.push_str("\t\ttracer: tracer,\n");
    result.push_str("\t\tprefix: prefix,\n");
    result.push_str("\t}\n");
    result.push_str("}\n");

    for method in &wrapper.methods {
        result.push('\n');
        result.push_str(&render_method(file, wrapper, &struct_type, method));
    }
    result
}

fn render_method(file: &FilePlan, wrapper: &WrapperPlan, struct_type: &str, method: &MethodPlan) -> String {
    let params = field_list(&method.params);
    let results = if method.results.is_empty() {
        String::new()
    } else {
        format!(" ({})", field_list(&method.results))
    };
    let args = method
        .params
        .iter()
        .map(|p| if p.is_variadic { format!("{}...", p.name) } else { p.name.clone() })
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("w.{}.{}({args})", wrapper.name, method.name);
    let span = &method.span_name;

    let mut result = format!("// {} ...\n", method.name);
    result.push_str(&format!(
        "func (w *{struct_type}) {}({params}){results} {{\n",
        method.name
    ));
    result.push_str(&format!(
        "\t{ctx}, {span} := w.tracer.Start({ctx}, w.prefix + \"{}\")\n",
        method.name,
        ctx = method.ctx_name
    ));
    result.push_str(&format!("\tdefer {span}.End()\n\n"));

    if method.results.is_empty() {
        result.push_str(&format!("\t{call}\n"));
    } else {
        let receivers = method
            .results
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        result.push_str(&format!("\t{receivers} = {call}\n"));
        if let Some(err) = &method.err_name {
            result.push_str(&format!("\tif {err} != nil {{\n"));
            result.push_str(&format!("\t\t{span}.RecordError({err})\n"));
            result.push_str(&format!("\t\t{span}.SetStatus({}, {err}.Error())\n", file.codes_error));
            result.push_str("\t}\n");
        }
        result.push_str(&format!("\treturn {receivers}\n"));
    }
    result.push_str("}\n");
    result
}

fn field_list(fields: &[FieldPlan]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.is_variadic {
                format!("{} ...{}", f.name, f.type_text)
            } else {
                format!("{} {}", f.name, f.type_text)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
