use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn keybind(key: &'static str, pad: usize, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, model: &str) {
    let p = Paragraph::new(vec![
        Line::from("Atajos:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Salir"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Tab", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Shift-Tab", Style::default().fg(Color::Magenta)),
            Span::raw(" Cambiar de pestaña"),
        ]),
        keybind("F1", 10, "Mostrar esta ayuda"),
        Line::from(""),
        Line::from("Formularios:"),
        keybind("↑/↓", 9, "Cambiar de campo"),
        keybind("←/→", 9, "Cambiar la opción seleccionada"),
        keybind("texto", 7, "Escribir en Título, Artista o la pregunta"),
        keybind("Enter", 7, "Generar (o enviar la pregunta)"),
        keybind("Ctrl-R", 6, "Reiniciar la pestaña"),
        keybind("PgUp/PgDn", 2, "Desplazar el resultado"),
        Line::from(""),
        Line::from("Resultados:"),
        keybind("Ctrl-E", 6, "Exportar HTML imprimible al directorio actual"),
        keybind("Ctrl-Y", 6, "Copiar el resultado al portapapeles"),
        keybind("Ctrl-S", 6, "Mostrar/ocultar la lectura en voz (Acordes)"),
        Line::from(""),
        Line::from("Modelo:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(model.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Ayuda"));
    f.render_widget(p, area);
}
