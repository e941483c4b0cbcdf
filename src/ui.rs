use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::{COLUMN_LABELS, HELP_TEXT, UdirConfig};
use crate::model::{Model, Order};

pub const HEADER_HEIGHT: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const NOTICE_HEIGHT: u16 = 1;

const ROW_HEIGHT: u16 = 2;
const ROW_HEIGHT_DENSE: u16 = 1;

pub struct TableUI;

impl TableUI {
    pub fn new(_cfg: &UdirConfig) -> Self {
        Self
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let has_notice = model.view().error.is_some();
        let notice_height = if has_notice { NOTICE_HEIGHT } else { 0 };
        let [header_area, notice_area, table_area, footer_area] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(notice_height),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_header(model, frame, header_area);
        if has_notice {
            self.draw_notice(model, frame, notice_area);
        }
        self.draw_table(model, frame, table_area);
        self.draw_footer(model, frame, footer_area);

        if model.show_help() {
            self.draw_help(frame);
        }
    }

    fn draw_header(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let search = if model.searching() {
            let input = model.search_input();
            let (head, tail) = split_at_char(&input.input, input.curser_pos);
            Line::from(vec![
                Span::raw(" Search: "),
                Span::raw(head.to_string()),
                Span::styled("▏", Style::new().fg(Color::Yellow)),
                Span::raw(tail.to_string()),
            ])
            .yellow()
        } else if model.view().search.is_empty() {
            Line::from(" Search: (/)").dim()
        } else {
            Line::from(format!(" Search: {}", model.view().search))
        };

        let [title_area, search_area] =
            Layout::horizontal([Constraint::Length(8), Constraint::Min(0)]).areas(area);
        frame.render_widget(Line::from(" Users ".bold()), title_area);
        frame.render_widget(search, search_area);
    }

    fn draw_notice(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some(notice) = &model.view().error {
            let line = Line::from(format!(" {notice} (Esc)"))
                .style(Style::new().fg(Color::White).bg(Color::Red));
            frame.render_widget(line, area);
        }
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.view();
        let row_height = if view.dense {
            ROW_HEIGHT_DENSE
        } else {
            ROW_HEIGHT
        };

        let header = Row::new(COLUMN_LABELS.iter().enumerate().map(|(idx, label)| {
            let marker = if view.order_by.column() == idx {
                match view.order {
                    Order::Asc => " ▲",
                    Order::Desc => " ▼",
                }
            } else {
                ""
            };
            let text = format!("{label}{marker}");
            let line = if idx == 0 {
                Line::from(text)
            } else {
                Line::from(text).right_aligned()
            };
            Cell::from(line.style(Style::new().add_modifier(Modifier::BOLD)))
        }))
        .style(Style::new().fg(Color::Black).bg(Color::Green))
        .height(1);

        let mut rows: Vec<Row> = model
            .visible()
            .iter()
            .enumerate()
            .map(|(ridx, record)| {
                let cells = record.cells().into_iter().enumerate().map(|(cidx, text)| {
                    let line = if cidx == 0 {
                        Line::from(text)
                    } else {
                        Line::from(text).right_aligned()
                    };
                    Cell::from(line)
                });
                let style = if ridx == model.cursor() {
                    Style::new().add_modifier(Modifier::REVERSED)
                } else {
                    Style::new()
                };
                Row::new(cells).style(style).height(row_height)
            })
            .collect();

        // Trailing short pages keep their full height with blank rows.
        for _ in 0..model.empty_rows() {
            rows.push(Row::new([""; 6]).height(row_height));
        }

        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Fill(3),
            Constraint::Fill(3),
        ];
        let table = Table::new(rows, widths).header(header).column_spacing(1);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.view();
        let filtered = model.filtered_len();
        let first = if filtered == 0 {
            0
        } else {
            view.page * view.rows_per_page + 1
        };
        let last = std::cmp::min((view.page + 1) * view.rows_per_page, filtered);
        let pages = std::cmp::max(1, filtered.div_ceil(view.rows_per_page));

        let mut status = format!(
            " {first}-{last} of {filtered} | page {}/{} | {} rows",
            view.page + 1,
            pages,
            view.rows_per_page,
        );
        if filtered != model.total() {
            status.push_str(&format!(" | {} total", model.total()));
        }
        if view.dense {
            status.push_str(" | dense");
        }
        if !model.status_message().is_empty() {
            status.push_str(&format!(" | {}", model.status_message()));
        }

        let [status_area, hint_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(16)]).areas(area);
        frame.render_widget(Line::from(status).dim(), status_area);
        frame.render_widget(Line::from("? help  q quit ").dim().right_aligned(), hint_area);
    }

    fn draw_help(&self, frame: &mut Frame) {
        let area = centered_rect(frame.area(), 44, 18);
        let popup = Paragraph::new(HELP_TEXT).block(Block::bordered().title(" Help "));
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = std::cmp::min(width, area.width);
    let height = std::cmp::min(height, area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn split_at_char(s: &str, pos: usize) -> (&str, &str) {
    let byte = s
        .char_indices()
        .nth(pos)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    s.split_at(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = centered_rect(area, 44, 18);
        assert!(rect.x + rect.width <= 80);
        assert!(rect.y + rect.height <= 24);

        let tiny = Rect::new(0, 0, 20, 5);
        let rect = centered_rect(tiny, 44, 18);
        assert_eq!((rect.width, rect.height), (20, 5));
    }

    #[test]
    fn split_at_char_respects_utf8_boundaries() {
        assert_eq!(split_at_char("ülke", 1), ("ü", "lke"));
        assert_eq!(split_at_char("abc", 5), ("abc", ""));
    }
}
