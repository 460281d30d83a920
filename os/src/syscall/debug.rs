use crate::{
    mm::{PageTableView, VirtAddr},
    println,
    task::{current_process, current_trap_cx, current_user_satp},
};

/// Walk the caller's frame-pointer chain and print one function name per
/// frame, stopping at `max_frames` or at `main`. Every frame word is read
/// through the caller's page table. An address that resolves to no symbol
/// ends the walk; it is reported, never fatal.
pub fn sys_backtrace(max_frames: usize) -> isize {
    if max_frames == 0 {
        return 0;
    }
    let process = current_process();
    let view = PageTableView::from_satp(current_user_satp());
    let cx = current_trap_cx();
    // The leaf frame has not spilled its return address yet; take it from
    // the saved context along with the frame pointer in s0.
    let mut ra = cx.gprs[1];
    let mut fp = cx.gprs[8];
    for _ in 0..max_frames {
        let name = match process.debug_info.resolve_function(ra) {
            Some(name) => name,
            None => {
                println!("<no symbol covers {:#x}>", ra);
                return 1;
            }
        };
        println!("{}", name);
        if name == "main" || fp < 16 {
            break;
        }
        let next_ra = read_user_word(&view, fp - 8);
        let next_fp = read_user_word(&view, fp - 16);
        match (next_ra, next_fp) {
            (Some(next_ra), Some(next_fp)) => {
                ra = next_ra;
                fp = next_fp;
            }
            _ => {
                println!("<frame at {:#x} is not mapped>", fp);
                return 1;
            }
        }
    }
    0
}

fn read_user_word(view: &PageTableView, va: usize) -> Option<usize> {
    view.translate_va(VirtAddr::from(va))
        .map(|pa| *pa.get_ref::<usize>())
}
