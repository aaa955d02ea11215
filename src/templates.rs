//! Sample report markup for testing and demonstration.
//!
//! Each template exercises a different part of the tag vocabulary. None of
//! them refer to external files, so they render anywhere.

/// Invoice-style document with a boxed header, columns and a rule.
pub fn invoice_template() -> &'static str {
    r#"{$PRINTINIT}{$COPIES(2)}{$SETFONT16}{$BOLDON}Invoice #2024-001{$BOLDOFF}{$SETFONT10}

{$BOXS(head)}{$PUSHPOS}{$DOWN(1)}{$B1}From:{$B0}{$RIGHT(40)}{$B1}To:{$B0}
Acme Corp{$RIGHT(40)}Client Inc
123 Business St{$RIGHT(40)}456 Client Ave
New York, NY 10001{$RIGHT(40)}Los Angeles, CA 90001
{$MR(530,0)}{$RBOXE(head)}{$POPPOS}{$DOWN(6)}
{$B1}Item{$RIGHT(30)}Qty{$RIGHT(40)}Price{$RIGHT(52)}Total{$B0}
{$LW(0.5)}{$L1}{$MR(520,0)}{$L0}
Web Development{$RIGHT(30)}40{$RIGHT(40)}150.00{$RIGHT(52)}6,000.00
Design Services{$RIGHT(30)}20{$RIGHT(40)}125.00{$RIGHT(52)}2,500.00
Hosting (Annual){$RIGHT(30)}1{$RIGHT(40)}500.00{$RIGHT(52)}500.00

{$RIGHT(44)}{$SETFONT12}{$BOLDON}Total: 9,000.00{$BOLDOFF}
{$PRINTEND}
"#
}

/// Plain report with headings in different families and sizes.
pub fn report_template() -> &'static str {
    r#"{$PRINTINIT}{$FONTNAME(helvetica)}{$SETFONT(size=14)}{$B1}Quarterly Report{$B0}
{$SF(10)}{$I1}Prepared by the operations team{$I0}

{$FONTNAME(times)}Revenue grew in every region this quarter.
{$LMARGIN(2)}{$printstring(line=Indented paragraph set with a wider margin.)}
{$LMARGIN}Back at the default margin.
{$SETCOLOR(0.6,0,0)}Figures in red are provisional.{$SETCOLOR(0,0,0)}
{$PRINTEND}
"#
}

/// Enough lines to spill over onto several pages, plus an explicit break.
pub fn multi_page_template() -> String {
    let mut markup = String::from("{$PRINTINIT}{$BOLDON}Line listing{$BOLDOFF}\n");
    for i in 1..=150 {
        markup.push_str(&format!("Line {i:03} of the listing\n"));
    }
    markup.push_str("{$NEWPAGE}Appendix on its own page\n{$PRINTEND}\n");
    markup
}

/// Positioning tags: absolute and relative moves, boxes and lines.
pub fn layout_template() -> &'static str {
    r#"{$MA(2,3)}{$BOXS}{$MR(200,0)}Top right of the first box{$MR(0,40)}{$BOXE}
{$MA(2,6)}{$RBOXS(r)}{$MR(300,60)}{$RBOXE(r)}
{$MA(2,10)}{$LINES(rule)}{$MA(19,10)}{$LINEE(rule)}
{$MA(y=12)}Same column, lower down
{$UP(1)}One line up{$DOWN(2,12)}Two 12pt lines down
"#
}

/// A single word.
pub fn minimal_template() -> &'static str {
    "Hello\n"
}
